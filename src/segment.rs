//! Sentence boundary detection.
//!
//! A character-at-a-time automaton: `?` and `!` close a sentence at once, a run
//! of exactly one or three dots closes it at the next non-newline character,
//! and any other dot run is a fault. Strings and files drive the same automaton
//! so identical character sequences always segment identically.
use crate::error::{Result, WhisperError};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Bytes, Read};
use std::iter::Peekable;
use std::path::Path;
use std::sync::LazyLock;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n ]+").expect("regex for blank runs"));

/// Incremental sentence detector.
#[derive(Debug, Default)]
pub struct SentenceDetector {
    buffer: String,
    dots: usize,
    offset: usize,
}

impl SentenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one character; returns a sentence when this character closed one.
    pub fn push(&mut self, character: char) -> Result<Option<String>> {
        let offset = self.offset;
        self.offset += 1;
        match character {
            // The dot counter is left untouched here; a pending dot run then
            // closes an empty sentence at the next ordinary character.
            '?' | '!' => {
                self.buffer.push(character);
                Ok(Some(self.take_sentence()))
            }
            '.' => {
                self.dots += 1;
                self.buffer.push('.');
                Ok(None)
            }
            '\n' if self.dots > 0 => Ok(None),
            '\n' => {
                self.buffer.push('\n');
                Ok(None)
            }
            _ if self.dots > 0 => {
                if !valid_dot_run(self.dots) {
                    return Err(WhisperError::Segmentation {
                        offset,
                        character: Some(character),
                        dots: self.dots,
                    });
                }
                self.dots = 0;
                let sentence = self.take_sentence();
                self.buffer.push(character);
                Ok(Some(sentence))
            }
            _ => {
                self.buffer.push(character);
                Ok(None)
            }
        }
    }

    /// Signal end of input; returns the residual sentence when non-empty.
    pub fn finish(&mut self) -> Result<Option<String>> {
        if self.dots != 0 && !valid_dot_run(self.dots) {
            return Err(WhisperError::Segmentation {
                offset: self.offset,
                character: None,
                dots: self.dots,
            });
        }
        self.dots = 0;
        let sentence = self.take_sentence();
        Ok((!sentence.is_empty()).then_some(sentence))
    }

    fn take_sentence(&mut self) -> String {
        let raw = std::mem::take(&mut self.buffer);
        normalize(&raw)
    }
}

fn valid_dot_run(dots: usize) -> bool {
    dots == 1 || dots == 3
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c| matches!(c, ' ' | '\n' | '\t'));
    BLANK_RUN.replace_all(trimmed, " ").into_owned()
}

/// Iterator adapter turning a character stream into sentences.
///
/// `\r\n` line endings are read as `\n`.
pub struct Sentences<I: Iterator> {
    chars: Peekable<I>,
    detector: SentenceDetector,
    done: bool,
}

impl<I> Sentences<I>
where
    I: Iterator<Item = Result<char>>,
{
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.peekable(),
            detector: SentenceDetector::new(),
            done: false,
        }
    }
}

impl<I> Iterator for Sentences<I>
where
    I: Iterator<Item = Result<char>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.chars.next() {
                Some(Ok('\r')) if matches!(self.chars.peek(), Some(Ok('\n'))) => continue,
                Some(Ok(character)) => match self.detector.push(character) {
                    Ok(Some(sentence)) => return Some(Ok(sentence)),
                    Ok(None) => continue,
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                },
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return self.detector.finish().transpose();
                }
            }
        }
    }
}

/// Stream sentences out of an in-memory string.
pub fn sentences_from_str(text: &str) -> Sentences<impl Iterator<Item = Result<char>> + '_> {
    Sentences::new(text.chars().map(Ok))
}

/// Collect every sentence of a string, failing on the first fault.
pub fn split_sentences(text: &str) -> Result<Vec<String>> {
    sentences_from_str(text).collect()
}

/// Stream sentences out of an ASCII file.
pub fn sentences_from_file(path: &Path) -> Result<Sentences<AsciiChars<BufReader<File>>>> {
    let file = File::open(path)?;
    Ok(Sentences::new(AsciiChars::new(BufReader::new(file))))
}

/// Decodes a byte stream as ASCII, one character per byte.
///
/// Bytes above 0x7f are reported as [`WhisperError::Encoding`] rather than
/// being replaced.
pub struct AsciiChars<R> {
    bytes: Bytes<R>,
    offset: usize,
}

impl<R: Read> AsciiChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            offset: 0,
        }
    }
}

impl<R: Read> Iterator for AsciiChars<R> {
    type Item = Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = match self.bytes.next()? {
            Ok(byte) => byte,
            Err(err) => return Some(Err(err.into())),
        };
        let offset = self.offset;
        self.offset += 1;
        if byte.is_ascii() {
            Some(Ok(char::from(byte)))
        } else {
            Some(Err(WhisperError::Encoding { offset, byte }))
        }
    }
}

/// Read a whole ASCII file into a string.
pub fn read_ascii(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    AsciiChars::new(BufReader::new(file)).collect()
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
