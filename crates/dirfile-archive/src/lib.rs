//! Resource resolution over Director classic and Afterburner containers
//!
//! [`Archive`] opens a movie or cast buffer, detects its byte order and
//! storage layout, and exposes every resource through one interface no
//! matter whether the file stores plain chunks or Afterburner compressed
//! segments:
//!
//! ```no_run
//! use dirfile_archive::{Archive, FourCC};
//!
//! # fn main() -> dirfile_archive::Result<()> {
//! let archive = Archive::open(std::fs::read("movie.dxr")?)?;
//! for entry in archive.entries_by_tag(FourCC::CAS_STAR) {
//!     let library = archive.cast_library(entry.id)?;
//!     println!("{} members", library.members.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Classic payloads are zero-copy slices of the input. Afterburner segments
//! are inflated on first access and memoized, so repeated loads of the same
//! resource return identical bytes without inflating again.

#![warn(missing_docs)]

pub mod archive;
pub mod cache;
pub mod cast;
pub mod config;
pub mod directory;

pub use archive::{Archive, ExportedResource};
pub use cache::CacheStats;
pub use cast::{CastLibrary, CastMemberSlot};
pub use config::ArchiveConfig;
pub use directory::{ResourceDirectory, ResourceEntry, StorageKind};

pub use dirfile_formats::cast::MemberType;
pub use dirfile_formats::keytable::ParentLink;
pub use dirfile_formats::{ByteReader, Endianness, FourCC, ReadError, StorageLayout};

use dirfile_formats::afterburner::AfterburnerError;
use dirfile_formats::classic::ClassicError;
use dirfile_formats::keytable::KeyTableError;
use dirfile_formats::rifx::RifxError;
use std::fmt::Display;
use thiserror::Error;

/// Archive error types
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Input is not a recognized RIFX/XFIR container
    #[error("unsupported container format: {0}")]
    UnsupportedFormat(String),

    /// A read went past the end of its buffer
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The chunk directory is inconsistent; the container cannot be opened
    #[error("corrupt directory: {0}")]
    Directory(String),

    /// One resource cannot be decoded; other resources are unaffected
    #[error("resource {id} is corrupt: {reason}")]
    CorruptChunk {
        /// Resource id
        id: u32,
        /// What went wrong
        reason: String,
    },

    /// No resource with this id
    #[error("resource {0} not found")]
    NotFound(u32),

    /// I/O error while reading the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Build a [`ArchiveError::CorruptChunk`]
    pub fn corrupt(id: u32, reason: impl Display) -> Self {
        Self::CorruptChunk {
            id,
            reason: reason.to_string(),
        }
    }

    /// Whether the error is scoped to a single resource
    pub const fn is_resource_scoped(&self) -> bool {
        matches!(self, Self::CorruptChunk { .. } | Self::NotFound(_))
    }
}

impl From<RifxError> for ArchiveError {
    fn from(err: RifxError) -> Self {
        match err {
            RifxError::Read(e) => Self::Read(e),
            other => Self::UnsupportedFormat(other.to_string()),
        }
    }
}

impl From<ClassicError> for ArchiveError {
    fn from(err: ClassicError) -> Self {
        match err {
            ClassicError::Read(e) => Self::Read(e),
            other => Self::Directory(other.to_string()),
        }
    }
}

impl From<AfterburnerError> for ArchiveError {
    fn from(err: AfterburnerError) -> Self {
        match err {
            AfterburnerError::Read(e) => Self::Read(e),
            other => Self::Directory(other.to_string()),
        }
    }
}

impl From<KeyTableError> for ArchiveError {
    fn from(err: KeyTableError) -> Self {
        match err {
            KeyTableError::Read(e) => Self::Read(e),
            other => Self::Directory(other.to_string()),
        }
    }
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
