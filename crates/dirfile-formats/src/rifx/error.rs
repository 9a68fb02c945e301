//! Container header error types

use crate::fourcc::FourCC;
use crate::reader::ReadError;
use thiserror::Error;

/// Errors raised while detecting the container format
#[derive(Debug, Error)]
pub enum RifxError {
    /// First four bytes are neither `RIFX` nor `XFIR`
    #[error("unsupported container magic {0:?}")]
    UnsupportedFormat([u8; 4]),

    /// Codec is not one of the classic or Afterburner codecs
    #[error("unsupported container codec '{0}'")]
    UnsupportedCodec(FourCC),

    /// No movie header could be located in the buffer
    #[error("no RIFX/XFIR header found")]
    MovieNotFound,

    /// Header truncated
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result type for container header operations
pub type RifxResult<T> = Result<T, RifxError>;
