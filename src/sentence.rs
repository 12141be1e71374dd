//! Sentence values and their word-count parity.
//!
//! Parity is the unit of information: one sentence carries one bit, `0` for an
//! even number of words and `1` for an odd number.
use crate::codec::Bit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("regex for whitespace runs"));
static WORD_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;]+").expect("regex for word separators"));

/// Word-count parity of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_count(count: usize) -> Self {
        if count % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn from_bit(bit: Bit) -> Self {
        if bit & 1 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn bit(self) -> Bit {
        match self {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }
}

/// An immutable sentence: the trimmed display string plus its words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Sentence {
    text: String,
    words: Vec<String>,
}

impl Sentence {
    pub fn new(raw: &str) -> Self {
        Self {
            text: raw.trim().to_string(),
            words: split_words(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn parity(&self) -> Parity {
        Parity::of_count(self.words.len())
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Sentence {
    fn from(raw: String) -> Self {
        Sentence::new(&raw)
    }
}

impl From<Sentence> for String {
    fn from(sentence: Sentence) -> Self {
        sentence.text
    }
}

/// Canonical form used for word splitting.
///
/// Whitespace runs collapse to one space, the trailing run of `.`, `!`, `?`
/// and spaces is removed, then leading whitespace is removed.
pub fn clean(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw, " ");
    collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?') || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Split on runs of whitespace, commas and semicolons.
///
/// Empty pieces are kept, so an empty sentence still counts as one word.
pub fn split_words(raw: &str) -> Vec<String> {
    WORD_SEPARATORS
        .split(&clean(raw))
        .map(str::to_string)
        .collect()
}
