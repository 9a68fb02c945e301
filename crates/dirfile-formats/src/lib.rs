//! Parsers for Director RIFX/XFIR movie and cast containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Offsets stored as unsigned varints
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // FourCC names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! Director stores movies (`.dir`, `.dxr`) and casts (`.cst`, `.cxt`) in a
//! RIFF-like container. This crate decodes every structure needed to turn
//! such a file into an addressable set of resources, without holding any
//! state of its own:
//!
//! - **Reader**: bounds-checked cursor with switchable byte order
//! - **RIFX**: container header, byte order and storage layout detection
//! - **Classic**: uncompressed `imap`/`mmap` chunk directory
//! - **Afterburner**: compressed `Fver`/`Fcdr`/`ABMP`/`FGEI` directory and
//!   its initial load segment
//! - **Key table**: `KEY*` parent/child ownership links
//! - **Cast**: `CAS*` slot tables and `CASt` member headers
//!
//! # Byte order
//!
//! A `RIFX` magic means big-endian, an `XFIR` magic little-endian. The
//! choice applies to every fixed-width integer read afterwards, including
//! FourCC tags, which is why little-endian files store tags reversed.
//! Cast tables and cast member headers are the exception and are always
//! big-endian.

#![warn(missing_docs)]

/// Afterburner (compressed) chunk directory
pub mod afterburner;

/// Cast tables and cast member headers
pub mod cast;

/// Classic (uncompressed) chunk directory
pub mod classic;

/// Four character chunk tags
pub mod fourcc;

/// `KEY*` parent/child link table
pub mod keytable;

/// Bounds-checked byte reader
pub mod reader;

/// Container header detection
pub mod rifx;

pub use fourcc::FourCC;
pub use reader::{ByteReader, Endianness, ReadError, ReadResult};
pub use rifx::{RifxHeader, StorageLayout};
