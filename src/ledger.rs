//! The sentence ledger: one entry per cover sentence, in cover order.
//!
//! Entries live in an [`IndexedStore`] whose index equals the sentence
//! position, so a position lookup is a bounds check plus an identity check.
use crate::dump;
use crate::error::{Result, WhisperError};
use crate::segment;
use crate::sentence::Sentence;
use crate::store::IndexedStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Insertion index inside the backing store.
    pub index: usize,
    /// 0-based order in the cover text.
    pub position: usize,
    pub sentence: Sentence,
    /// Rewrite instruction, present only when the sentence must change parity.
    pub prompt: Option<String>,
    /// Final sentence: the original passed through, or an accepted rewrite.
    pub reformulation: Option<String>,
}

impl LedgerEntry {
    pub fn needs_rewrite(&self) -> bool {
        self.prompt.is_some()
    }
}

pub struct Ledger<S> {
    store: S,
}

impl<S> Ledger<S>
where
    S: IndexedStore<LedgerEntry>,
{
    /// Wrap a store; existing entries (a reopened ledger) are kept.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append a sentence at the next position and return that position.
    pub fn push_sentence(&mut self, sentence: &str) -> Result<usize> {
        let position = self.store.len()?;
        self.store.append(LedgerEntry {
            index: position,
            position,
            sentence: Sentence::new(sentence),
            prompt: None,
            reformulation: None,
        })?;
        Ok(position)
    }

    pub fn load_sentences<I>(&mut self, sentences: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut count = 0;
        for sentence in sentences {
            self.push_sentence(&sentence?)?;
            count += 1;
        }
        Ok(count)
    }

    /// Segment `text` and append one entry per sentence.
    pub fn load_str(&mut self, text: &str) -> Result<usize> {
        self.load_sentences(segment::sentences_from_str(text))
    }

    /// Segment an ASCII file and append one entry per sentence.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        self.load_sentences(segment::sentences_from_file(path)?)
    }

    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    pub fn entry(&self, position: usize) -> Result<LedgerEntry> {
        let entry = self.store.get(position).map_err(|err| match err {
            WhisperError::Lookup { .. } => invalid_position(position),
            other => other,
        })?;
        if entry.position != position {
            return Err(invalid_position(position));
        }
        Ok(entry)
    }

    /// All entries in position order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        (0..self.len()?).map(|index| self.store.get(index)).collect()
    }

    /// Number of entries carrying a rewrite prompt.
    pub fn pending_count(&self) -> Result<usize> {
        let mut count = 0;
        for index in 0..self.len()? {
            if self.store.get(index)?.needs_rewrite() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Page through prompted entries in insertion order.
    pub fn pending_batch(&self, offset: usize, limit: usize) -> Result<Vec<LedgerEntry>> {
        let mut batch = Vec::new();
        let mut skipped = 0;
        for index in 0..self.len()? {
            if batch.len() == limit {
                break;
            }
            let entry = self.store.get(index)?;
            if !entry.needs_rewrite() {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            batch.push(entry);
        }
        Ok(batch)
    }

    pub fn set_prompt(&mut self, position: usize, prompt: Option<String>) -> Result<()> {
        let mut entry = self.entry(position)?;
        entry.prompt = prompt;
        self.store.set(entry.index, entry)
    }

    pub fn set_reformulation(&mut self, position: usize, reformulation: String) -> Result<()> {
        let mut entry = self.entry(position)?;
        entry.reformulation = Some(reformulation);
        self.store.set(entry.index, entry)
    }

    /// Human-readable table of the ledger, one row per position.
    pub fn render_dump(&self) -> Result<String> {
        Ok(dump::render(&self.entries()?))
    }

    pub fn destroy(&mut self) -> Result<()> {
        self.store.destroy()
    }
}

fn invalid_position(position: usize) -> WhisperError {
    WhisperError::Lookup {
        what: "position",
        index: position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ledger_from(text: &str) -> Ledger<MemoryStore<LedgerEntry>> {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.load_str(text).expect("load text");
        ledger
    }

    #[test]
    fn single_sentence_loads_with_empty_fields() {
        let ledger = ledger_from("This is a test.");
        assert_eq!(ledger.len().expect("len"), 1);
        let entry = ledger.entry(0).expect("entry 0");
        assert_eq!(entry.position, 0);
        assert_eq!(entry.sentence.as_str(), "This is a test.");
        assert_eq!(entry.sentence.word_count(), 4);
        assert!(entry.prompt.is_none());
        assert!(entry.reformulation.is_none());
    }

    #[test]
    fn positions_follow_cover_order() {
        let ledger = ledger_from("This is a test.\nAnd the rest...");
        let second = ledger.entry(1).expect("entry 1");
        assert_eq!(second.position, 1);
        assert_eq!(second.sentence.as_str(), "And the rest...");
    }

    #[test]
    fn segmentation_fault_aborts_loading() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let err = ledger
            .load_str("This is a test.\n.")
            .expect_err("dangling dots must fail");
        assert!(matches!(err, WhisperError::Segmentation { .. }));
    }

    #[test]
    fn out_of_range_position_is_a_lookup_fault() {
        let mut ledger = ledger_from("One. Two.");
        let err = ledger.entry(2).expect_err("position 2 is absent");
        assert_eq!(err.to_string(), "invalid position: 2");
        assert!(ledger.set_prompt(9, Some("x".into())).is_err());
        assert!(ledger.set_reformulation(9, "x".into()).is_err());
    }

    #[test]
    fn prompts_and_reformulations_update_by_position() {
        let mut ledger = ledger_from("sentence1. sentence2.");
        ledger
            .set_prompt(0, Some("prompt1".to_string()))
            .expect("set prompt");
        ledger.set_prompt(1, None).expect("clear prompt");
        assert_eq!(ledger.pending_count().expect("count"), 1);

        ledger
            .set_reformulation(0, "reformulated sentence1".to_string())
            .expect("set reformulation");
        let first = ledger.entry(0).expect("entry 0");
        assert_eq!(first.prompt.as_deref(), Some("prompt1"));
        assert_eq!(
            first.reformulation.as_deref(),
            Some("reformulated sentence1")
        );
        let second = ledger.entry(1).expect("entry 1");
        assert!(second.prompt.is_none());
        assert!(second.reformulation.is_none());
    }

    #[test]
    fn pending_batches_page_in_order() {
        let mut ledger = ledger_from("A. B. C. D. E. F. G.");
        for position in [1, 2, 4, 6] {
            ledger
                .set_prompt(position, Some(format!("p{position}")))
                .expect("set prompt");
        }
        let positions = |batch: Vec<LedgerEntry>| -> Vec<usize> {
            batch.into_iter().map(|entry| entry.position).collect()
        };
        assert_eq!(positions(ledger.pending_batch(0, 3).expect("page 0")), [1, 2, 4]);
        assert_eq!(positions(ledger.pending_batch(3, 3).expect("page 1")), [6]);
        assert!(ledger.pending_batch(4, 3).expect("page 2").is_empty());
        assert!(ledger.pending_batch(0, 0).expect("empty limit").is_empty());
    }
}
