//! Reformulation oracle clients.
//!
//! The core only needs [`Oracle::call`]: a list of role/content messages in,
//! the model's raw text out. Two clients ship with the binary:
//!
//! - [`ChatCompletionsOracle`] posts to an OpenAI-compatible
//!   `/chat/completions` endpoint.
//! - [`CommandOracle`] pipes the messages as JSON into a user-configured
//!   command (`llm`, `ollama run`, a wrapper script...) and reads stdout.
//!
//! Neither retries: a failed call is fatal for the run, and the hider attaches
//! the call/request indexes before propagating it.
mod chat;
mod command;

pub use chat::{ChatCompletionsOracle, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use command::CommandOracle;

use crate::request::ChatMessage;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub trait Oracle {
    fn call(&mut self, messages: &[ChatMessage]) -> Result<String>;
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn call(&mut self, messages: &[ChatMessage]) -> Result<String> {
        (**self).call(messages)
    }
}

#[derive(Debug, Deserialize)]
struct RewriteResults {
    results: Vec<String>,
}

/// Parse a `{"results": [...]}` reply, tolerating markdown code fences.
pub fn parse_results(text: &str) -> Result<Vec<String>> {
    let json_text = extract_json(text);
    let parsed: RewriteResults = serde_json::from_str(json_text).with_context(|| {
        format!(
            "parse oracle response as JSON: {}",
            &text[..floor_char_boundary(text, 500)]
        )
    })?;
    Ok(parsed.results)
}

/// Extract JSON from text that might have markdown code fences.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip a language identifier on the fence line.
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    text
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    (0..=max)
        .rev()
        .find(|&index| text.is_char_boundary(index))
        .unwrap_or(0)
}

/// Load an API token from `path`.
///
/// The file must exist and hold a non-empty token. A token readable by group
/// or others is accepted with a warning.
pub fn load_token(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(anyhow!("token file not found: {}", path.display()));
    }
    warn_on_loose_permissions(path);
    let token = fs::read_to_string(path)
        .with_context(|| format!("read token file {}", path.display()))?
        .trim()
        .to_string();
    if token.is_empty() {
        return Err(anyhow!("token file {} is empty", path.display()));
    }
    Ok(token)
}

#[cfg(unix)]
fn warn_on_loose_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "token file permissions should be 600 (rw-------)"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_on_loose_permissions(_path: &Path) {}
