//! CLI argument parsing for the `whisper` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "whisper",
    version,
    about = "Hide a payload in the word-count parity of a cover text's sentences",
    after_help = "Commands:\n  hide <payload> <cover> <output>     Rewrite the cover text so it carries the payload\n  reveal <disguised> <output>         Recover a payload from a disguised text\n  dump --ledger <db> --out <txt>      Render a persisted ledger as a table\n  check <dump>                        Re-verify the rewritten rows of a ledger dump\n  config init                         Write a default config file\n\nExamples:\n  whisper hide secret.txt novel.txt disguised.txt --state-dir /tmp/whisper --keep-state\n  WHISPER_LM_COMMAND='llm -m local' whisper hide secret.txt novel.txt disguised.txt\n  whisper reveal disguised.txt recovered.txt",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Hide(HideArgs),
    Reveal(RevealArgs),
    Dump(DumpArgs),
    Check(CheckArgs),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
#[command(about = "Conceal a payload inside a cover text")]
pub struct HideArgs {
    /// ASCII file holding the payload
    pub payload: PathBuf,

    /// ASCII cover text with at least 64 + 8 * payload bytes sentences
    pub cover: PathBuf,

    /// Where to write the disguised text
    pub output: PathBuf,

    /// JSON config file (defaults to <config dir>/whisper/config.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Chat completions model
    #[arg(long)]
    pub model: Option<String>,

    /// API token file for the chat completions oracle
    #[arg(long, value_name = "PATH")]
    pub token: Option<PathBuf>,

    /// Local command used as the oracle (messages JSON on stdin)
    #[arg(long, value_name = "CMD")]
    pub lm_command: Option<String>,

    /// Rewrites per oracle request
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Give up after this many replay passes
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Directory for ledger, request, and response dumps (emptied first)
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Keep the ledger and request queue in SQLite files under DIR
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Leave the state files in place after the run
    #[arg(long, requires = "state_dir")]
    pub keep_state: bool,

    /// Plan and queue requests, then stop before calling the oracle
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Recover a payload from a disguised text")]
pub struct RevealArgs {
    /// Disguised text, one sentence per line
    pub disguised: PathBuf,

    /// Where to write the recovered payload
    pub output: PathBuf,

    /// Debug-level logging
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Render a persisted ledger as a table")]
pub struct DumpArgs {
    /// Ledger database (stegano-db.sqlite in a kept state dir)
    #[arg(long, value_name = "PATH")]
    pub ledger: PathBuf,

    /// Output file; stdout when omitted
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Re-verify rewritten rows of a ledger dump")]
pub struct CheckArgs {
    /// Ledger dump produced by `whisper dump` or a debug dir
    pub dump: PathBuf,
}

#[derive(Subcommand, Debug)]
#[command(about = "Manage the config file")]
pub enum ConfigCommand {
    Init(ConfigInitArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a default config file")]
pub struct ConfigInitArgs {
    /// Target path (defaults to <config dir>/whisper/config.json)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
