use super::Oracle;
use crate::request::ChatMessage;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Blocking client for an OpenAI-compatible chat completions endpoint.
///
/// No timeout is set on the agent, so a hung call blocks the run.
pub struct ChatCompletionsOracle {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    token: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatCompletionsOracle {
    pub fn new(endpoint: &str, model: &str, token: String) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Oracle for ChatCompletionsOracle {
    fn call(&mut self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages,
        };
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", format!("Bearer {}", self.token))
            .send_json(&body)
            .with_context(|| format!("POST {url}"))?;
        let parsed: ChatResponse = response
            .body_mut()
            .read_json()
            .context("decode chat completion response")?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = %self.model,
            messages = messages.len(),
            "oracle call complete"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion response has no message content"))
    }
}
