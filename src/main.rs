use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use whisper::config::{self, OracleOverrides, WhisperConfig};
use whisper::debug::DirectorySink;
use whisper::dump::{self, Verdict};
use whisper::hider::{HideSettings, Hider};
use whisper::ledger::{Ledger, LedgerEntry};
use whisper::request::RequestBatch;
use whisper::revealer;
use whisper::segment;
use whisper::store::{IndexedStore, MemoryStore, SqliteStore};

mod cli;
use cli::{
    CheckArgs, Command, ConfigCommand, ConfigInitArgs, DumpArgs, HideArgs, RevealArgs, RootArgs,
};

/// Ledger database inside `--state-dir`.
const LEDGER_DB: &str = "stegano-db.sqlite";
/// Request queue database inside `--state-dir`.
const REQUESTS_DB: &str = "requests-db.sqlite";
const LOG_ENV: &str = "WHISPER_LOG";

fn main() -> Result<()> {
    let cli = RootArgs::parse();
    init_logging(cli.command.verbose());

    match cli.command {
        Command::Hide(args) => cmd_hide(args),
        Command::Reveal(args) => cmd_reveal(args),
        Command::Dump(args) => cmd_dump(args),
        Command::Check(args) => cmd_check(args),
        Command::Config(ConfigCommand::Init(args)) => cmd_config_init(args),
    }
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Hide(args) => args.verbose,
            Command::Reveal(args) => args.verbose,
            _ => false,
        }
    }
}

/// Logs go to stderr; `WHISPER_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_hide(args: HideArgs) -> Result<()> {
    let config = config::resolve_config(args.config.as_deref())?;
    let mut settings = config.hide_settings();
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(max_retries) = args.max_retries {
        settings.max_retries = Some(max_retries);
    }

    let payload = segment::read_ascii(&args.payload)
        .with_context(|| format!("read payload {}", args.payload.display()))?;

    let Some(state_dir) = args.state_dir.as_deref() else {
        return run_hide(
            &args,
            &config,
            settings,
            payload.as_bytes(),
            MemoryStore::new(),
            MemoryStore::new(),
        );
    };

    let ledger = SqliteStore::create(&state_dir.join(LEDGER_DB))
        .with_context(|| format!("create ledger in {}", state_dir.display()))?;
    let requests = SqliteStore::create(&state_dir.join(REQUESTS_DB))
        .with_context(|| format!("create request queue in {}", state_dir.display()))?;
    let result = run_hide(&args, &config, settings, payload.as_bytes(), ledger, requests);
    if args.keep_state {
        tracing::info!(dir = %state_dir.display(), "kept ledger and request queue");
    } else {
        discard_state(state_dir)?;
    }
    result
}

fn run_hide<L, Q>(
    args: &HideArgs,
    config: &WhisperConfig,
    settings: HideSettings,
    payload: &[u8],
    ledger_store: L,
    requests: Q,
) -> Result<()>
where
    L: IndexedStore<LedgerEntry>,
    Q: IndexedStore<RequestBatch>,
{
    let mut ledger = Ledger::new(ledger_store);
    let sentences = ledger
        .load_file(&args.cover)
        .with_context(|| format!("load cover text {}", args.cover.display()))?;
    tracing::info!(sentences, payload_bytes = payload.len(), "loaded cover text");

    let mut hider = Hider::new(settings, ledger, requests, payload)?;
    if let Some(dir) = &args.debug_dir {
        hider = hider.with_debug_sink(Box::new(DirectorySink::prepare(dir)?));
    }

    let outcome = drive(&mut hider, args, config);
    if !args.keep_state {
        hider.destroy()?;
    }
    outcome
}

fn drive<L, Q>(hider: &mut Hider<L, Q>, args: &HideArgs, config: &WhisperConfig) -> Result<()>
where
    L: IndexedStore<LedgerEntry>,
    Q: IndexedStore<RequestBatch>,
{
    if args.dry_run {
        let queued = hider.dry_run()?;
        println!("dry run: {queued} request batch(es) queued, oracle not called");
        return Ok(());
    }

    let overrides = OracleOverrides {
        lm_command: args.lm_command.clone(),
        model: args.model.clone(),
        token_path: args.token.clone(),
    }
    .with_env();
    let mut oracle = config::connect(&overrides.apply(&config.oracle))?;
    let disguised = hider.hide(&mut oracle)?;
    fs::write(&args.output, disguised.as_bytes())
        .with_context(|| format!("write {}", args.output.display()))?;
    println!(
        "wrote {} ({} oracle pass(es))",
        args.output.display(),
        hider.passes()
    );
    Ok(())
}

/// Remove whatever state files a failed or finished run left behind.
fn discard_state(state_dir: &Path) -> Result<()> {
    for name in [LEDGER_DB, REQUESTS_DB] {
        let path = state_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("remove {}", path.display()));
            }
        }
    }
    Ok(())
}

fn cmd_reveal(args: RevealArgs) -> Result<()> {
    let payload = revealer::reveal_file(&args.disguised)
        .with_context(|| format!("reveal {}", args.disguised.display()))?;
    let text = revealer::payload_to_ascii(payload)?;
    fs::write(&args.output, text.as_bytes())
        .with_context(|| format!("write {}", args.output.display()))?;
    tracing::info!(bytes = text.len(), "payload recovered");
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> Result<()> {
    if !args.ledger.is_file() {
        return Err(anyhow!("ledger not found: {}", args.ledger.display()));
    }
    let store = SqliteStore::<LedgerEntry>::open(&args.ledger)?;
    let ledger = Ledger::new(store);
    let table = ledger.render_dump()?;
    match &args.out {
        Some(path) => {
            fs::write(path, table.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
        }
        None => std::io::stdout()
            .write_all(table.as_bytes())
            .context("write dump to stdout")?,
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let text = fs::read_to_string(&args.dump)
        .with_context(|| format!("read {}", args.dump.display()))?;
    let mut failures = 0;
    for (verdict, line) in dump::check(&text) {
        match verdict {
            Verdict::Flipped => println!("S {line}"),
            Verdict::Unflipped => {
                failures += 1;
                println!("E {line}");
            }
            Verdict::Malformed => {
                failures += 1;
                println!("? {line}");
            }
            Verdict::PassThrough => {}
        }
    }
    if failures > 0 {
        return Err(anyhow!("{failures} row(s) failed the parity check"));
    }
    Ok(())
}

fn cmd_config_init(args: ConfigInitArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => config::default_config_path()
            .ok_or_else(|| anyhow!("no config directory; pass --path"))?,
    };
    config::write_config(&path, &config::config_stub()?, args.force)?;
    println!("wrote {}", path.display());
    Ok(())
}
