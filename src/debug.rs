//! Human-readable dumps of a concealment run.
//!
//! The hider reports ledger snapshots, queued requests, and raw oracle replies
//! to an optional [`DebugSink`]. Without a sink nothing is written.
//!
//! [`DirectorySink`] lays the dumps out as plain files:
//! - `haystack-pre-processing.txt`: ledger after planning
//! - `haystack-post-processing-<call>.txt`: ledger after each oracle pass
//! - `request-<n>.txt`: one queued request batch
//! - `llm-response-call-<call>-req-<req>.txt`: raw oracle reply
use crate::request::RequestBatch;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub trait DebugSink {
    /// Ledger dump after planning (`call = None`) or after oracle pass `call`.
    fn ledger_snapshot(&mut self, call: Option<usize>, dump: &str) -> Result<()>;

    fn request(&mut self, number: usize, batch: &RequestBatch) -> Result<()>;

    fn response(&mut self, call: usize, request: usize, raw: &str) -> Result<()>;
}

pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Empty `root` (creating it when missing) and write dumps there.
    pub fn prepare(root: &Path) -> Result<Self> {
        if root.is_dir() {
            for entry in
                fs::read_dir(root).with_context(|| format!("read {}", root.display()))?
            {
                let path = entry?.path();
                let removed = if path.is_dir() {
                    fs::remove_dir_all(&path)
                } else {
                    fs::remove_file(&path)
                };
                removed.with_context(|| format!("remove {}", path.display()))?;
            }
        } else {
            fs::create_dir_all(root)
                .with_context(|| format!("create debug dir {}", root.display()))?;
        }
        tracing::debug!(dir = %root.display(), "debug dumps enabled");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.root.join(name);
        fs::write(&path, contents.as_bytes()).with_context(|| format!("write {}", path.display()))
    }
}

impl DebugSink for DirectorySink {
    fn ledger_snapshot(&mut self, call: Option<usize>, dump: &str) -> Result<()> {
        let name = match call {
            None => "haystack-pre-processing.txt".to_string(),
            Some(call) => format!("haystack-post-processing-{call}.txt"),
        };
        self.write(&name, dump)
    }

    fn request(&mut self, number: usize, batch: &RequestBatch) -> Result<()> {
        let text = format!(
            "messages: {}\npositions: {:?}\n\n{}\n",
            batch.messages.len(),
            batch.positions,
            batch.messages_json()?
        );
        self.write(&format!("request-{number}.txt"), &text)
    }

    fn response(&mut self, call: usize, request: usize, raw: &str) -> Result<()> {
        self.write(&format!("llm-response-call-{call}-req-{request}.txt"), raw)
    }
}
