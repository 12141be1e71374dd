//! Ledger dumps for human review, and re-verification of a saved dump.
//!
//! Row layout: `position | sentence | Y/N | rewrite counter | reformulation`.
//! `Y` rows were sent to the oracle; `N` rows passed through unchanged.
use crate::ledger::LedgerEntry;
use crate::sentence::Sentence;

pub fn render(entries: &[LedgerEntry]) -> String {
    let sentence_width = entries
        .iter()
        .map(|entry| entry.sentence.as_str().chars().count())
        .max()
        .unwrap_or(0);
    let reformulation_width = entries
        .iter()
        .filter_map(|entry| entry.reformulation.as_deref())
        .map(|text| text.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let mut counter = 0usize;
    for entry in entries {
        let reformulation = entry.reformulation.as_deref().unwrap_or("");
        let (flag, counter_cell) = if entry.needs_rewrite() {
            counter += 1;
            ("Y", counter.to_string())
        } else {
            ("N", String::new())
        };
        out.push_str(&format!(
            "{:<5} | {:<sw$} | {} | {:<5} | {:<rw$}\n",
            entry.position,
            entry.sentence.as_str(),
            flag,
            counter_cell,
            reformulation,
            sw = sentence_width,
            rw = reformulation_width,
        ));
    }
    out
}

/// Outcome of re-checking one dump row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Rewrite changed the parity.
    Flipped,
    /// Rewrite kept the original parity.
    Unflipped,
    /// Pass-through row, nothing to check.
    PassThrough,
    /// Row does not have five `|`-separated fields.
    Malformed,
}

/// Re-verify every row of a dump. Blank lines are skipped.
pub fn check(text: &str) -> Vec<(Verdict, String)> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| (check_line(line), line.to_string()))
        .collect()
}

fn check_line(line: &str) -> Verdict {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let [_, original, action, _, reformulation] = fields.as_slice() else {
        return Verdict::Malformed;
    };
    match *action {
        "N" => Verdict::PassThrough,
        "Y" => {
            let before = Sentence::new(original).parity();
            let after = Sentence::new(reformulation).parity();
            if before == after {
                Verdict::Unflipped
            } else {
                Verdict::Flipped
            }
        }
        _ => Verdict::Malformed,
    }
}
