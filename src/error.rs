//! Fault types shared by the segmenter, codec, stores, and ledger.
//!
//! Workflow layers (hider, oracle clients, CLI) wrap these in `anyhow` with
//! extra context; callers that need to branch on a fault kind can recover it
//! with `err.downcast_ref::<WhisperError>()`.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WhisperError>;

#[derive(Debug, Error)]
pub enum WhisperError {
    /// A dot run of an unsupported length closed a sentence.
    #[error("invalid character {} at offset {offset} (dot counter={dots})", describe_char(.character))]
    Segmentation {
        offset: usize,
        character: Option<char>,
        dots: usize,
    },

    #[error("codec fault: {0}")]
    Codec(String),

    #[error("{subject} holds {available} sentences but at least {required} are required")]
    Capacity {
        subject: &'static str,
        required: usize,
        available: usize,
    },

    #[error("invalid {what}: {index}")]
    Lookup { what: &'static str, index: usize },

    #[error("store has been destroyed")]
    StoreDestroyed,

    #[error("invalid byte 0x{byte:02x} at offset {offset} (expected ASCII)")]
    Encoding { offset: usize, byte: u8 },

    #[error("oracle call failed [call:{call}, req:{request}]: {reason}")]
    Oracle {
        call: usize,
        request: usize,
        reason: String,
    },

    /// The assembled output segments differently from the ledger, so the
    /// sentence at `position` no longer carries its payload bit.
    #[error("disguised text does not read back: sentence {position} should carry bit {expected}")]
    Integrity { position: usize, expected: u8 },

    #[error("gave up after {attempts} replay attempts with {pending} sentence(s) still unflipped")]
    RetriesExhausted { attempts: u32, pending: usize },

    #[error("storage: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_char(character: &Option<char>) -> String {
    match character {
        Some(c) => format!("{c:?}"),
        None => "<end of input>".to_string(),
    }
}
