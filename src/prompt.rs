//! Prompt templates for rewrite requests.
//!
//! Defaults are compiled in from `prompts/*.md`; a config file may replace any
//! of them.
use crate::sentence::Parity;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

const SYSTEM: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/system.md"));
const STYLE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/style.md"));
const REWRITE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/rewrite.md"));
const RESULTS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/results.md"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptTemplates {
    /// Persona sent as the system message.
    pub system: String,
    /// Style constraints sent as the assistant framing message.
    pub style: String,
    /// Per-sentence instruction; must contain `{parity}` and `{sentence}`.
    pub rewrite: String,
    pub even_word: String,
    pub odd_word: String,
    /// Trailing instruction demanding `{"results": [...]}`.
    pub results: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: SYSTEM.trim().to_string(),
            style: STYLE.trim().to_string(),
            rewrite: REWRITE.trim().to_string(),
            even_word: "even".to_string(),
            odd_word: "odd".to_string(),
            results: RESULTS.trim().to_string(),
        }
    }
}

impl PromptTemplates {
    /// Instruction asking the oracle to give `sentence` the `target` parity.
    pub fn rewrite_prompt(&self, target: Parity, sentence: &str) -> String {
        let parity = match target {
            Parity::Even => &self.even_word,
            Parity::Odd => &self.odd_word,
        };
        self.rewrite
            .replace("{parity}", parity)
            .replace("{sentence}", sentence)
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("system", &self.system),
            ("style", &self.style),
            ("rewrite", &self.rewrite),
            ("even_word", &self.even_word),
            ("odd_word", &self.odd_word),
            ("results", &self.results),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("prompts.{label} must be non-empty"));
            }
        }
        for placeholder in ["{parity}", "{sentence}"] {
            if !self.rewrite.contains(placeholder) {
                return Err(anyhow!("prompts.rewrite must contain {placeholder}"));
            }
        }
        Ok(())
    }
}
