//! Error types for the syncscan engine.
//!
//! All engine failures that represent caller contract violations are reported
//! through [`SyncscanError`]. Search-space inconsistencies and resource
//! exhaustion are *not* errors: they are reported through flags on
//! [`crate::CorrStats`] so a partial result can still be returned.

use thiserror::Error;

/// Primary error type for the syncscan engine.
#[derive(Debug, Error)]
pub enum SyncscanError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The syncseq bit size is outside the supported range.
    #[error("syncseq bit size out of range: {bit_size} (expected 1..=32)")]
    InvalidSyncseqBitSize { bit_size: u32 },

    /// The syncseq word is zero after masking to its bit size.
    #[error("syncseq word is zero after masking to {bit_size} bits")]
    ZeroSyncseq { bit_size: u32 },

    /// An empty bit stream was supplied.
    #[error("empty bit stream")]
    EmptyStream,

    /// The declared bit length does not fit into the supplied buffer.
    #[error("bit length {bit_len} exceeds buffer capacity of {capacity} bits")]
    BitLengthOutOfRange { bit_len: u64, capacity: u64 },

    /// The stream is too short to hold even a single syncseq window.
    #[error("stream of {stream_bits} bits is too short for a {syncseq_bits}-bit syncseq")]
    StreamTooShort { stream_bits: u64, syncseq_bits: u32 },

    /// A bit-granular copy was asked to read or write past a buffer end.
    #[error("bit range {offset}..{offset}+{count} is out of bounds for a {capacity}-bit buffer")]
    BitRangeOutOfBounds {
        offset: u64,
        count: u64,
        capacity: u64,
    },
}

/// Result type alias for syncscan operations.
pub type Result<T> = std::result::Result<T, SyncscanError>;
