//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use whisper::codec;
use whisper::oracle::Oracle;
use whisper::request::ChatMessage;

/// Five-word sentences (odd parity), one per line.
pub fn odd_cover(count: usize) -> String {
    (0..count)
        .map(|i| format!("Sentence number {i} is here.\n"))
        .collect()
}

/// A cover whose sentences already carry `payload`, so no rewrite is needed.
pub fn encoded_cover(payload: &[u8], extra: usize) -> String {
    let mut cover: String = codec::payload_to_bits(payload)
        .iter()
        .map(|&bit| {
            if bit == 1 {
                "The river runs.\n"
            } else {
                "The river runs north.\n"
            }
        })
        .collect();
    for _ in 0..extra {
        cover.push_str("Nothing else happens here.\n");
    }
    cover
}

fn quoted_sentence(prompt: &str) -> &str {
    match (prompt.find('"'), prompt.rfind('"')) {
        (Some(start), Some(end)) if end > start => &prompt[start + 1..end],
        _ => prompt,
    }
}

/// Add one word before the terminal punctuation.
pub fn flip(sentence: &str) -> String {
    let body = sentence.trim_end_matches(['.', '!', '?']);
    format!("{body} indeed{}", &sentence[body.len()..])
}

/// Oracle that flips every requested sentence, after echoing them unchanged
/// for the first `refusals` calls.
pub struct ScriptedOracle {
    pub refusals: usize,
    pub calls: usize,
}

impl ScriptedOracle {
    pub fn flipping() -> Self {
        Self::stubborn(0)
    }

    pub fn stubborn(refusals: usize) -> Self {
        Self { refusals, calls: 0 }
    }
}

impl Oracle for ScriptedOracle {
    fn call(&mut self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.calls += 1;
        let echo = self.calls <= self.refusals;
        let results: Vec<String> = messages[2..messages.len() - 1]
            .iter()
            .map(|message| {
                let sentence = quoted_sentence(&message.content);
                if echo {
                    sentence.to_string()
                } else {
                    flip(sentence)
                }
            })
            .collect();
        // Fenced, as chat models often reply.
        Ok(format!(
            "```json\n{}\n```",
            serde_json::json!({ "results": results })
        ))
    }
}

/// Run the `whisper` binary isolated from the user's config and LM command.
pub fn run_whisper(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_whisper"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("WHISPER_LM_COMMAND")
        .env("WHISPER_LOG", "warn")
        .output()
        .expect("run whisper")
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
