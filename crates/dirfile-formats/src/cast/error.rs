//! Cast error types

use crate::reader::ReadError;
use thiserror::Error;

/// Errors raised while decoding cast structures
#[derive(Debug, Error)]
pub enum CastError {
    /// Member payload shorter than its fixed header
    #[error("cast member payload of {0} bytes is shorter than its 12-byte header")]
    TruncatedHeader(usize),

    /// Malformed bytes
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result type for cast operations
pub type CastResult<T> = Result<T, CastError>;
