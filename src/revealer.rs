//! Payload extraction: one parity bit per disguised sentence.
use crate::codec::{self, Bit, LENGTH_HEADER_BITS};
use crate::error::{Result, WhisperError};
use crate::segment::{self, Sentences};
use crate::sentence::Sentence;
use std::path::Path;

/// Decode a payload from the parity bits of consecutive sentences.
///
/// Bits past the declared payload length are ignored.
pub fn reveal_bits(bits: &[Bit]) -> Result<Vec<u8>> {
    if bits.len() < LENGTH_HEADER_BITS {
        return Err(WhisperError::Capacity {
            subject: "disguised text",
            required: LENGTH_HEADER_BITS,
            available: bits.len(),
        });
    }
    let (header, body) = bits.split_at(LENGTH_HEADER_BITS);
    let length = codec::bits_to_int64(header)?;
    let length = usize::try_from(length)
        .map_err(|_| WhisperError::Codec(format!("negative payload length {length}")))?;
    let body_bits = length
        .checked_mul(8)
        .filter(|&needed| needed <= body.len())
        .ok_or(WhisperError::Capacity {
            subject: "disguised text",
            required: LENGTH_HEADER_BITS.saturating_add(length.saturating_mul(8)),
            available: bits.len(),
        })?;
    codec::bits_to_bytes(&body[..body_bits])
}

fn reveal_sentences<I>(sentences: Sentences<I>) -> Result<Vec<u8>>
where
    I: Iterator<Item = Result<char>>,
{
    let bits = sentences
        .map(|sentence| sentence.map(|text| Sentence::new(&text).parity().bit()))
        .collect::<Result<Vec<Bit>>>()?;
    tracing::debug!(sentences = bits.len(), "read parity bits");
    reveal_bits(&bits)
}

pub fn reveal_text(text: &str) -> Result<Vec<u8>> {
    reveal_sentences(segment::sentences_from_str(text))
}

pub fn reveal_file(path: &Path) -> Result<Vec<u8>> {
    reveal_sentences(segment::sentences_from_file(path)?)
}

/// Check that a recovered payload is ASCII before it is written out as text.
pub fn payload_to_ascii(payload: Vec<u8>) -> Result<String> {
    if let Some(offset) = payload.iter().position(|byte| !byte.is_ascii()) {
        return Err(WhisperError::Encoding {
            offset,
            byte: payload[offset],
        });
    }
    Ok(payload.into_iter().map(char::from).collect())
}
