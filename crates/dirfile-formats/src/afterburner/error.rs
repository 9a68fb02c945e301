//! Afterburner error types

use crate::fourcc::FourCC;
use crate::reader::ReadError;
use thiserror::Error;

/// Errors raised while reading Afterburner maps and segments
#[derive(Debug, Error)]
pub enum AfterburnerError {
    /// Control chunks appeared out of order
    #[error("expected '{expected}' chunk at offset {offset}, found '{found}'")]
    UnexpectedChunk {
        /// Tag that should be there
        expected: FourCC,
        /// Tag that was read
        found: FourCC,
        /// Absolute offset of the chunk tag
        offset: usize,
    },

    /// The map has no entry for the initial load segment
    #[error("Afterburner map has no initial load segment (resource 2)")]
    MissingInitialLoadSegment,

    /// Segment stored inline has no bytes outside the initial load segment
    #[error("resource {0} has no stored segment")]
    NotStored(u32),

    /// zlib stream is corrupt
    #[error("zlib decompression failed: {0}")]
    Inflate(String),

    /// Inflated size differs from the declared size
    #[error("inflated {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Declared uncompressed length
        expected: usize,
        /// Bytes produced (or a lower bound once the declared size was exceeded)
        actual: usize,
    },

    /// Declared or produced size exceeds the configured limit
    #[error("decompressed size {size} exceeds limit of {limit} bytes")]
    TooLarge {
        /// Size that was requested or produced
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Truncated or malformed map bytes
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result type for Afterburner operations
pub type AfterburnerResult<T> = Result<T, AfterburnerError>;
