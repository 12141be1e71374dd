//! Run configuration.
//!
//! An optional JSON file selects the oracle, the batch size, the replay cap,
//! and the prompt templates. CLI flags and `WHISPER_LM_COMMAND` override it.
use crate::hider::{HideSettings, DEFAULT_BATCH_SIZE};
use crate::oracle::{self, ChatCompletionsOracle, CommandOracle, Oracle};
use crate::prompt::PromptTemplates;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Environment variable selecting the command oracle.
pub const LM_COMMAND_ENV: &str = "WHISPER_LM_COMMAND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhisperConfig {
    pub schema_version: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// `null` replays until every rewrite validates.
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub prompts: PromptTemplates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum OracleConfig {
    ChatCompletions {
        #[serde(default = "default_endpoint")]
        endpoint: String,
        #[serde(default = "default_model")]
        model: String,
        /// Defaults to `<config dir>/whisper/token`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_path: Option<PathBuf>,
    },
    Command {
        command: String,
    },
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig::ChatCompletions {
            endpoint: default_endpoint(),
            model: default_model(),
            token_path: None,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_endpoint() -> String {
    oracle::DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    oracle::DEFAULT_MODEL.to_string()
}

impl WhisperConfig {
    pub fn hide_settings(&self) -> HideSettings {
        HideSettings {
            batch_size: self.batch_size,
            max_retries: self.max_retries,
            prompts: self.prompts.clone(),
        }
    }
}

pub fn default_config() -> WhisperConfig {
    WhisperConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        batch_size: DEFAULT_BATCH_SIZE,
        max_retries: None,
        oracle: OracleConfig::default(),
        prompts: PromptTemplates::default(),
    }
}

/// Pretty JSON for `config init`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// `<config dir>/whisper/<name>`, when the platform has a config dir.
fn user_config_file(name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("whisper").join(name))
}

pub fn default_config_path() -> Option<PathBuf> {
    user_config_file("config.json")
}

pub fn default_token_path() -> Option<PathBuf> {
    user_config_file("token")
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<WhisperConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: WhisperConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// The explicit config, else the user config file if present, else defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<WhisperConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "using user config");
            load_config(&path)
        }
        _ => Ok(default_config()),
    }
}

/// Write rendered config `text`, refusing to replace a file unless `force`.
pub fn write_config(path: &Path, text: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{text}\n")).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &WhisperConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.batch_size == 0 {
        return Err(anyhow!("batch_size must be at least 1"));
    }
    match &config.oracle {
        OracleConfig::ChatCompletions {
            endpoint, model, ..
        } => {
            if endpoint.trim().is_empty() {
                return Err(anyhow!("oracle.endpoint must be non-empty"));
            }
            if model.trim().is_empty() {
                return Err(anyhow!("oracle.model must be non-empty"));
            }
        }
        OracleConfig::Command { command } => {
            if command.trim().is_empty() {
                return Err(anyhow!("oracle.command must be non-empty"));
            }
        }
    }
    config.prompts.validate()
}

/// Command-line choices that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct OracleOverrides {
    pub lm_command: Option<String>,
    pub model: Option<String>,
    pub token_path: Option<PathBuf>,
}

impl OracleOverrides {
    /// Fill `lm_command` from `WHISPER_LM_COMMAND` when the flag is absent.
    pub fn with_env(mut self) -> Self {
        if self.lm_command.is_none() {
            self.lm_command = std::env::var(LM_COMMAND_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty());
        }
        self
    }

    pub fn apply(&self, config: &OracleConfig) -> OracleConfig {
        if let Some(command) = &self.lm_command {
            return OracleConfig::Command {
                command: command.clone(),
            };
        }
        match config {
            OracleConfig::ChatCompletions {
                endpoint,
                model,
                token_path,
            } => OracleConfig::ChatCompletions {
                endpoint: endpoint.clone(),
                model: self.model.clone().unwrap_or_else(|| model.clone()),
                token_path: self.token_path.clone().or_else(|| token_path.clone()),
            },
            other => other.clone(),
        }
    }
}

/// Build the oracle client a config describes, loading its token if needed.
pub fn connect(config: &OracleConfig) -> Result<Box<dyn Oracle>> {
    match config {
        OracleConfig::ChatCompletions {
            endpoint,
            model,
            token_path,
        } => {
            let path = match token_path {
                Some(path) => path.clone(),
                None => default_token_path()
                    .ok_or_else(|| anyhow!("no config directory for the default token path"))?,
            };
            let token = oracle::load_token(&path)?;
            tracing::info!(%endpoint, %model, "using chat completions oracle");
            Ok(Box::new(ChatCompletionsOracle::new(endpoint, model, token)))
        }
        OracleConfig::Command { command } => {
            tracing::info!(%command, "using command oracle");
            Ok(Box::new(CommandOracle::new(command.clone())))
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
