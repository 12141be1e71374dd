//! Linguistic steganography through sentence word-count parity.
//!
//! [`hider::Hider`] asks a reformulation oracle to rewrite cover sentences
//! until each one's word count parity spells out a payload bit;
//! [`revealer`] reads the bits back.
pub mod codec;
pub mod config;
pub mod debug;
pub mod dump;
pub mod error;
pub mod hider;
pub mod ledger;
pub mod oracle;
pub mod prompt;
pub mod request;
pub mod revealer;
pub mod segment;
pub mod sentence;
pub mod store;
