use super::Oracle;
use crate::request::ChatMessage;
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Runs a local command per call: messages as a JSON array on stdin, the
/// model's reply on stdout.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    command: String,
}

impl CommandOracle {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Oracle for CommandOracle {
    fn call(&mut self, messages: &[ChatMessage]) -> Result<String> {
        let input = serde_json::to_string(messages).context("serialize oracle messages")?;
        invoke_lm_command(&self.command, &input)
    }
}

/// Invoke the LM command with the given input on stdin.
fn invoke_lm_command(command: &str, input: &str) -> Result<String> {
    let args =
        shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;

    if args.is_empty() {
        return Err(anyhow!("LM command is empty"));
    }

    let start = Instant::now();
    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn LM command: {}", args[0]))?;

    // A command that exits without reading stdin is judged by its status.
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(input.as_bytes()) {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(err).context("write messages to LM stdin");
            }
        }
    }

    let output = child.wait_with_output().context("wait for LM command")?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        elapsed_ms,
        input_bytes = input.len(),
        response_bytes = output.stdout.len(),
        "lm invoke complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "LM command failed with status {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")
}
