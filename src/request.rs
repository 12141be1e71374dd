//! Oracle request batches.
//!
//! A batch is two framing messages, one rewrite message per queued sentence,
//! and a trailing instruction asking for a JSON array of the same length.
//! `positions` is parallel to the rewrite messages.
use crate::ledger::LedgerEntry;
use crate::prompt::PromptTemplates;
use serde::{Deserialize, Serialize};

/// Number of framing messages before the rewrite messages.
const LEADING_MESSAGES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBatch {
    pub positions: Vec<usize>,
    pub messages: Vec<ChatMessage>,
}

impl RequestBatch {
    /// Build a batch from prompted ledger entries; entries without a prompt
    /// are left out.
    pub fn from_entries(templates: &PromptTemplates, entries: &[LedgerEntry]) -> Self {
        let mut positions = Vec::with_capacity(entries.len());
        let mut messages = vec![
            ChatMessage::new(Role::System, templates.system.as_str()),
            ChatMessage::new(Role::Assistant, templates.style.as_str()),
        ];
        for entry in entries {
            let Some(prompt) = entry.prompt.as_deref() else {
                continue;
            };
            positions.push(entry.position);
            messages.push(ChatMessage::new(Role::User, prompt));
        }
        messages.push(ChatMessage::new(Role::User, templates.results.as_str()));
        Self {
            positions,
            messages,
        }
    }

    /// The per-sentence rewrite messages, without framing or instruction.
    pub fn rewrite_messages(&self) -> &[ChatMessage] {
        let end = self.messages.len().saturating_sub(1).max(LEADING_MESSAGES);
        self.messages.get(LEADING_MESSAGES..end).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn messages_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::Sentence;

    fn entry(position: usize, prompt: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            index: position,
            position,
            sentence: Sentence::new("Some sentence."),
            prompt: prompt.map(str::to_string),
            reformulation: None,
        }
    }

    #[test]
    fn batch_frames_rewrites_with_fixed_messages() {
        let templates = PromptTemplates::default();
        let batch = RequestBatch::from_entries(
            &templates,
            &[entry(3, Some("rewrite three")), entry(8, Some("rewrite eight"))],
        );
        assert_eq!(batch.positions, [3, 8]);
        assert_eq!(batch.messages.len(), 2 + 2 + 1);
        assert_eq!(batch.messages[0].role, Role::System);
        assert_eq!(batch.messages[1].role, Role::Assistant);
        assert_eq!(batch.messages[4].content, templates.results);
        let rewrites: Vec<&str> = batch
            .rewrite_messages()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(rewrites, ["rewrite three", "rewrite eight"]);
    }

    #[test]
    fn empty_batch_keeps_framing_and_instruction() {
        let batch = RequestBatch::from_entries(&PromptTemplates::default(), &[]);
        assert!(batch.is_empty());
        assert_eq!(batch.messages.len(), 3);
        assert!(batch.rewrite_messages().is_empty());
    }

    #[test]
    fn entries_without_prompt_are_skipped() {
        let batch = RequestBatch::from_entries(
            &PromptTemplates::default(),
            &[entry(0, None), entry(1, Some("p"))],
        );
        assert_eq!(batch.positions, [1]);
        assert_eq!(batch.rewrite_messages().len(), 1);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = ChatMessage::new(Role::Assistant, "hi");
        let json = serde_json::to_value(&message).expect("serialize message");
        assert_eq!(json["role"], "assistant");
    }
}
