//! Bit-exact conversions between payload bytes and parity bits.
//!
//! A payload travels as a 64-bit big-endian byte-length header followed by
//! eight bits per payload byte, most significant bit first.
use crate::error::{Result, WhisperError};

/// A single bit, `0` or `1`.
pub type Bit = u8;

/// Width of the length header carried before the payload body.
pub const LENGTH_HEADER_BITS: usize = 64;

pub fn int64_to_bits(value: i64) -> Vec<Bit> {
    (0..64).rev().map(|shift| ((value >> shift) & 1) as Bit).collect()
}

pub fn bits_to_int64(bits: &[Bit]) -> Result<i64> {
    if bits.len() != LENGTH_HEADER_BITS {
        return Err(WhisperError::Codec(format!(
            "expected exactly 64 bits for an integer, got {}",
            bits.len()
        )));
    }
    Ok(bits
        .iter()
        .fold(0i64, |value, &bit| (value << 1) | i64::from(bit & 1)))
}

pub fn bytes_to_bits(bytes: &[u8]) -> Vec<Bit> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
        .collect()
}

pub fn bits_to_bytes(bits: &[Bit]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(WhisperError::Codec(format!(
            "bit count {} is not a multiple of 8",
            bits.len()
        )));
    }
    Ok(bits
        .chunks(8)
        .map(|group| group.iter().fold(0u8, |byte, &bit| (byte << 1) | (bit & 1)))
        .collect())
}

/// Encode a payload as its length header followed by its body bits.
pub fn payload_to_bits(payload: &[u8]) -> Vec<Bit> {
    let length = i64::try_from(payload.len()).unwrap_or(i64::MAX);
    let mut bits = int64_to_bits(length);
    bits.extend(bytes_to_bits(payload));
    bits
}

/// Number of parity bits (and so of cover sentences) a payload needs.
pub fn required_bits(payload_len: usize) -> usize {
    LENGTH_HEADER_BITS + payload_len * 8
}
