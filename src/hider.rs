//! Concealment orchestration.
//!
//! A run walks the ledger through five passes:
//! 1. plan: compare each sentence's parity with its payload bit, pass matching
//!    sentences through and attach a rewrite prompt to the others;
//! 2. batch: page prompted entries into fixed-size request batches, queued in
//!    the request store before any oracle call;
//! 3. call: send every queued batch and store the normalized rewrites;
//! 4. validate: re-check every rewrite and replay the failures as one batch
//!    until none remain (or `max_retries` is hit);
//! 5. finalize: emit one sentence per line in position order, then segment
//!    the result again and confirm every payload bit reads back.
use crate::codec::{self, Bit};
use crate::debug::DebugSink;
use crate::error::WhisperError;
use crate::ledger::{Ledger, LedgerEntry};
use crate::oracle::{self, Oracle};
use crate::prompt::PromptTemplates;
use crate::request::RequestBatch;
use crate::segment;
use crate::sentence::{Parity, Sentence};
use crate::store::IndexedStore;
use anyhow::{anyhow, Result};
use std::time::Instant;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Line that follows a rewrite when checking how it segments in context.
const FOLLOWING_LINE: &str = "Next.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HideSettings {
    /// Rewrites per oracle request; replay batches ignore it.
    pub batch_size: usize,
    /// Replay passes allowed after the first oracle pass; `None` retries
    /// until every rewrite validates.
    pub max_retries: Option<u32>,
    pub prompts: PromptTemplates,
}

impl Default for HideSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: None,
            prompts: PromptTemplates::default(),
        }
    }
}

pub struct Hider<L, Q> {
    settings: HideSettings,
    ledger: Ledger<L>,
    requests: Q,
    bits: Vec<Bit>,
    sink: Option<Box<dyn DebugSink>>,
    passes: usize,
    queued_total: usize,
}

impl<L, Q> Hider<L, Q>
where
    L: IndexedStore<LedgerEntry>,
    Q: IndexedStore<RequestBatch>,
{
    /// Prepare a run over a loaded ledger.
    ///
    /// Fails with a capacity fault when the cover text has fewer sentences
    /// than the payload needs bits.
    pub fn new(
        settings: HideSettings,
        ledger: Ledger<L>,
        requests: Q,
        payload: &[u8],
    ) -> Result<Self> {
        if settings.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }
        let bits = codec::payload_to_bits(payload);
        let available = ledger.len()?;
        if available < bits.len() {
            return Err(WhisperError::Capacity {
                subject: "cover text",
                required: bits.len(),
                available,
            }
            .into());
        }
        tracing::debug!(
            payload_bytes = payload.len(),
            bits = bits.len(),
            sentences = available,
            "cover text has capacity"
        );
        Ok(Self {
            settings,
            ledger,
            requests,
            bits,
            sink: None,
            passes: 0,
            queued_total: 0,
        })
    }

    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Assign a reformulation or a rewrite prompt to every position.
    ///
    /// Returns the number of sentences that need a rewrite. Planning the same
    /// ledger twice yields the same assignments.
    pub fn plan(&mut self) -> Result<usize> {
        let total = self.ledger.len()?;
        let mut rewrites = 0;
        for position in 0..total {
            let entry = self.ledger.entry(position)?;
            let target = self.bits.get(position).copied().map(Parity::from_bit);
            match target {
                Some(target) if entry.sentence.parity() != target => {
                    let prompt = self
                        .settings
                        .prompts
                        .rewrite_prompt(target, entry.sentence.as_str());
                    self.ledger.set_prompt(position, Some(prompt))?;
                    rewrites += 1;
                }
                _ => {
                    self.ledger.set_prompt(position, None)?;
                    self.ledger
                        .set_reformulation(position, entry.sentence.as_str().to_string())?;
                }
            }
        }
        tracing::info!(
            sentences = total,
            bits = self.bits.len(),
            rewrites,
            "planned concealment"
        );
        self.snapshot(None)?;
        Ok(rewrites)
    }

    /// Rebuild the request queue from the prompted entries.
    ///
    /// A trailing batch is always queued, empty when the prompted count is a
    /// multiple of the batch size. Returns the number of queued batches.
    pub fn build_requests(&mut self) -> Result<usize> {
        self.requests.clear()?;
        let size = self.settings.batch_size;
        let pending = self.ledger.pending_count()?;
        let full_batches = pending / size;
        for batch in 0..full_batches {
            let entries = self.ledger.pending_batch(batch * size, size)?;
            self.enqueue(&entries)?;
        }
        let remainder = self.ledger.pending_batch(full_batches * size, size)?;
        self.enqueue(&remainder)?;

        let queued = self.requests.len()?;
        tracing::info!(pending, batch_size = size, queued, "queued rewrite requests");
        Ok(queued)
    }

    /// Send every queued batch once and store the rewrites.
    ///
    /// Any failure (transport, unparsable reply, wrong result count) is an
    /// oracle fault tagged with the pass and request indexes.
    pub fn call_oracle(&mut self, oracle: &mut dyn Oracle) -> Result<()> {
        let call = self.passes;
        let queued = self.requests.len()?;
        for request in 0..queued {
            let batch = self.requests.get(request)?;
            let start = Instant::now();
            let raw = oracle
                .call(&batch.messages)
                .map_err(|err| oracle_fault(call, request, format!("{err:#}")))?;
            if let Some(sink) = self.sink.as_mut() {
                sink.response(call, request, &raw)?;
            }
            let results = oracle::parse_results(&raw)
                .map_err(|err| oracle_fault(call, request, format!("{err:#}")))?;
            if results.len() != batch.positions.len() {
                return Err(oracle_fault(
                    call,
                    request,
                    format!(
                        "invalid response: expected {} results, got {}",
                        batch.positions.len(),
                        results.len()
                    ),
                ));
            }
            for (&position, text) in batch.positions.iter().zip(&results) {
                self.ledger
                    .set_reformulation(position, terminate_sentence(text))?;
            }
            tracing::info!(
                call,
                request,
                rewrites = results.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "applied oracle response"
            );
        }
        self.passes += 1;
        self.snapshot(Some(call))?;
        Ok(())
    }

    /// Prompted entries whose stored rewrite would not carry the requested
    /// bit, in position order.
    pub fn check_responses(&self) -> Result<Vec<LedgerEntry>> {
        let mut replay = Vec::new();
        for entry in self.ledger.entries()? {
            if !entry.needs_rewrite() {
                continue;
            }
            if let Err(problem) = validate_rewrite(&entry) {
                tracing::warn!(
                    position = entry.position,
                    problem,
                    "parity for #{} has not been modified",
                    entry.position
                );
                replay.push(entry);
            }
        }
        Ok(replay)
    }

    /// Replay failing rewrites until all validate.
    pub fn converge(&mut self, oracle: &mut dyn Oracle) -> Result<()> {
        let mut attempts: u32 = 0;
        loop {
            let replay = self.check_responses()?;
            if replay.is_empty() {
                tracing::info!(replays = attempts, "all rewrites validated");
                return Ok(());
            }
            if let Some(max) = self.settings.max_retries {
                if attempts >= max {
                    return Err(WhisperError::RetriesExhausted {
                        attempts,
                        pending: replay.len(),
                    }
                    .into());
                }
            }
            attempts += 1;
            tracing::info!(
                attempt = attempts,
                sentences = replay.len(),
                "replaying unflipped rewrites"
            );
            self.requests.clear()?;
            self.enqueue(&replay)?;
            self.call_oracle(oracle)?;
        }
    }

    /// The disguised text: every reformulation on its own line.
    pub fn finalize(&self) -> Result<String> {
        let mut output = String::new();
        for entry in self.ledger.entries()? {
            match entry.reformulation.as_deref() {
                Some(text) => output.push_str(text),
                None => tracing::warn!(
                    position = entry.position,
                    "missing reformulation, writing an empty line"
                ),
            }
            output.push('\n');
        }
        Ok(output)
    }

    /// Segment `output` the way a reader will and check the payload bits.
    ///
    /// Neighbouring lines can change how a line segments (a `.?` ending
    /// leaves a dot run pending), which a per-rewrite check cannot see.
    pub fn verify_output(&self, output: &str) -> Result<()> {
        let mut sentences = segment::sentences_from_str(output);
        for (position, &expected) in self.bits.iter().enumerate() {
            let found = sentences
                .next()
                .transpose()?
                .map(|sentence| Sentence::new(&sentence).parity().bit());
            if found != Some(expected) {
                return Err(WhisperError::Integrity { position, expected }.into());
            }
        }
        tracing::debug!(bits = self.bits.len(), "disguised text reads back");
        Ok(())
    }

    /// Plan and queue requests without calling the oracle.
    pub fn dry_run(&mut self) -> Result<usize> {
        self.plan()?;
        self.build_requests()
    }

    /// Full concealment run.
    pub fn hide(&mut self, oracle: &mut dyn Oracle) -> Result<String> {
        let start = Instant::now();
        self.plan()?;
        self.build_requests()?;
        self.call_oracle(oracle)?;
        self.converge(oracle)?;
        let output = self.finalize()?;
        self.verify_output(&output)?;
        tracing::info!(
            passes = self.passes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "concealment complete"
        );
        Ok(output)
    }

    pub fn ledger(&self) -> &Ledger<L> {
        &self.ledger
    }

    pub fn requests(&self) -> &Q {
        &self.requests
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Oracle passes run so far, replays included.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn into_parts(self) -> (Ledger<L>, Q) {
        (self.ledger, self.requests)
    }

    /// Release both backing stores.
    pub fn destroy(&mut self) -> Result<()> {
        self.ledger.destroy()?;
        self.requests.destroy()?;
        Ok(())
    }

    fn enqueue(&mut self, entries: &[LedgerEntry]) -> Result<()> {
        let batch = RequestBatch::from_entries(&self.settings.prompts, entries);
        if let Some(sink) = self.sink.as_mut() {
            sink.request(self.queued_total, &batch)?;
        }
        self.queued_total += 1;
        self.requests.append(batch)?;
        Ok(())
    }

    fn snapshot(&mut self, call: Option<usize>) -> Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        let dump = self.ledger.render_dump()?;
        if let Some(sink) = self.sink.as_mut() {
            sink.ledger_snapshot(call, &dump)?;
        }
        Ok(())
    }
}

fn oracle_fault(call: usize, request: usize, reason: String) -> anyhow::Error {
    WhisperError::Oracle {
        call,
        request,
        reason,
    }
    .into()
}

/// Trim a rewrite and give it a final `.` unless it already ends a sentence.
pub fn terminate_sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '?', '!']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// A rewrite is accepted when it stays one sentence in the output and its
/// parity differs from the original's.
fn validate_rewrite(entry: &LedgerEntry) -> std::result::Result<(), &'static str> {
    let Some(text) = entry.reformulation.as_deref() else {
        return Err("missing rewrite");
    };
    let Some(rewrite) = single_sentence(text) else {
        return Err("rewrite does not segment as one sentence");
    };
    if rewrite.parity() == entry.sentence.parity() {
        return Err("parity unchanged");
    }
    Ok(())
}

/// Segment `text` followed by another output line; `None` unless it yields
/// exactly one sentence of its own.
fn single_sentence(text: &str) -> Option<Sentence> {
    let mut sentences = segment::split_sentences(&format!("{text}\n{FOLLOWING_LINE}")).ok()?;
    if sentences.len() != 2 || sentences.pop()? != FOLLOWING_LINE {
        return None;
    }
    sentences.pop().map(|sentence| Sentence::new(&sentence))
}

#[cfg(test)]
#[path = "hider_tests.rs"]
mod tests;
