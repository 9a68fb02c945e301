//! Classic directory error types

use crate::fourcc::FourCC;
use crate::reader::ReadError;
use thiserror::Error;

/// Errors raised while parsing the `imap`/`mmap` directory
#[derive(Debug, Error)]
pub enum ClassicError {
    /// A chunk header carried the wrong tag
    #[error("expected '{expected}' chunk at offset {offset}, found '{found}'")]
    UnexpectedChunk {
        /// Tag that should be there
        expected: FourCC,
        /// Tag that was read
        found: FourCC,
        /// Absolute offset of the chunk header
        offset: usize,
    },

    /// `mmap` header declares fewer than the 12 mandatory bytes
    #[error("mmap header size {0} is shorter than 12 bytes")]
    HeaderTooShort(u16),

    /// `mmap` entry size cannot hold an entry record
    #[error("mmap entry size {0} is shorter than 20 bytes")]
    EntryTooShort(u16),

    /// Directory record points outside the buffer
    #[error(
        "resource {id} ('{tag}') at offset {offset} with length {length} exceeds buffer of {buffer_len} bytes"
    )]
    EntryOutOfBounds {
        /// Resource id (index in the memory map)
        id: u32,
        /// Resource tag
        tag: FourCC,
        /// Offset of the chunk header
        offset: u32,
        /// Payload length
        length: u32,
        /// Size of the movie buffer
        buffer_len: usize,
    },

    /// Truncated or malformed directory bytes
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result type for classic directory operations
pub type ClassicResult<T> = Result<T, ClassicError>;
