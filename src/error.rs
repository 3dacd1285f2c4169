//! Error types for HPACK compression contexts.
//!
//! Every decode-side failure is fatal: the encoder's and decoder's tables are
//! no longer known to agree, and the rest of the header block cannot be
//! interpreted. Those variants carry the byte offset of the instruction that
//! failed so the transport can report it before tearing the connection down.

use thiserror::Error;

use crate::huffman::HuffmanError;

/// Result type for HPACK operations.
pub type Result<T> = std::result::Result<T, HpackError>;

/// Errors that can occur while compressing or decompressing a header list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HpackError {
    /// An integer or literal declares more bytes than the block holds.
    #[error("truncated header block: instruction at offset {offset} runs past the end")]
    Truncated { offset: usize },

    /// A prefixed integer does not fit in `usize`.
    #[error("integer overflow in instruction at offset {offset}")]
    IntegerOverflow { offset: usize },

    /// An Indexed instruction or indexed name addresses no table entry.
    #[error("invalid table index {index} at offset {offset} (table holds {len} entries)")]
    InvalidIndex {
        offset: usize,
        index: usize,
        len: usize,
    },

    /// A Huffman-coded literal could not be decoded.
    #[error("malformed Huffman literal in instruction at offset {offset}")]
    Huffman {
        offset: usize,
        #[source]
        source: HuffmanError,
    },

    /// The leading octet matches no instruction class.
    #[error("invalid instruction {octet:#04x} at offset {offset}")]
    InvalidInstruction { offset: usize, octet: u8 },

    /// A size update asks for more than the negotiated ceiling.
    #[error("table size update to {requested} exceeds ceiling {ceiling} (offset {offset})")]
    SizeUpdateTooLarge {
        offset: usize,
        requested: usize,
        ceiling: usize,
    },

    /// A header name or value cannot be expressed in the configured text encoding.
    #[error("{text:?} cannot be represented in the configured text encoding")]
    Unrepresentable { text: String },

    /// The context failed earlier and can no longer be used.
    #[error("HPACK context is unusable after an earlier decode failure")]
    Poisoned,
}

impl HpackError {
    /// Returns true if this error leaves the context permanently unusable.
    ///
    /// Input errors raised by `compress` before any state change are not fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HpackError::Unrepresentable { .. })
    }

    /// Offset of the offending instruction within the header block, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            HpackError::Truncated { offset }
            | HpackError::IntegerOverflow { offset }
            | HpackError::InvalidIndex { offset, .. }
            | HpackError::Huffman { offset, .. }
            | HpackError::InvalidInstruction { offset, .. }
            | HpackError::SizeUpdateTooLarge { offset, .. } => Some(*offset),
            HpackError::Unrepresentable { .. } | HpackError::Poisoned => None,
        }
    }
}
