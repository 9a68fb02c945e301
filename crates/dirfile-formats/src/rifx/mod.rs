//! RIFX/XFIR container header
//!
//! Every movie and cast file starts with a 12-byte header:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 4 | magic, `RIFX` (big-endian) or `XFIR` (little-endian) |
//! | 4 | 4 | length of the remainder of the file |
//! | 8 | 4 | codec, tells the classic and Afterburner layouts apart |
//!
//! Projectors embed the movie after their own executable code; see
//! [`locate_movie`].

mod error;

pub use error::{RifxError, RifxResult};

use crate::fourcc::FourCC;
use crate::reader::{ByteReader, Endianness};

/// Size of the container header in bytes
pub const HEADER_SIZE: usize = 12;

/// Markers written by projectors in front of the movie offset
const PROJECTOR_MARKERS: [&[u8; 4]; 4] = [b"PJ93", b"PJ95", b"PJ00", b"PJ01"];

/// How resources are laid out after the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageLayout {
    /// Uncompressed chunks indexed by `imap`/`mmap`
    Classic,
    /// Afterburner compressed segments indexed by `ABMP`
    Afterburner,
}

/// Decoded container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RifxHeader {
    /// Byte order of every later fixed-width integer
    pub endianness: Endianness,
    /// Declared length of the remainder of the file
    pub length: u32,
    /// Codec tag
    pub codec: FourCC,
    /// Resource layout implied by the codec
    pub layout: StorageLayout,
}

impl RifxHeader {
    /// Whether the codec identifies a cast rather than a movie
    pub fn is_cast(&self) -> bool {
        self.codec == FourCC::MC95 || self.codec == FourCC::FGDC
    }
}

/// Map a codec tag to a storage layout
pub fn layout_for_codec(codec: FourCC) -> Option<StorageLayout> {
    match codec {
        FourCC::MV93 | FourCC::MC95 | FourCC::APPL => Some(StorageLayout::Classic),
        FourCC::FGDM | FourCC::FGDC => Some(StorageLayout::Afterburner),
        _ => None,
    }
}

/// Detect byte order and storage layout from the start of `data`
pub fn detect(data: &[u8]) -> RifxResult<RifxHeader> {
    let mut reader = ByteReader::new(data, Endianness::Big);
    let magic: [u8; 4] = reader
        .read_bytes(4)?
        .try_into()
        .map_err(|_| RifxError::MovieNotFound)?;

    let endianness = match &magic {
        b"RIFX" => Endianness::Big,
        b"XFIR" => Endianness::Little,
        _ => return Err(RifxError::UnsupportedFormat(magic)),
    };
    reader.set_endianness(endianness);

    let length = reader.read_u32()?;
    let codec = reader.read_fourcc()?;
    let layout = layout_for_codec(codec).ok_or(RifxError::UnsupportedCodec(codec))?;

    Ok(RifxHeader {
        endianness,
        length,
        codec,
        layout,
    })
}

fn is_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"RIFX") || bytes.starts_with(b"XFIR")
}

fn magic_at(data: &[u8], offset: u32) -> bool {
    usize::try_from(offset)
        .ok()
        .and_then(|start| data.get(start..))
        .is_some_and(is_magic)
}

/// Find the offset of the movie header inside `data`
///
/// Checks offset zero, then a projector marker followed by a `u32` movie
/// offset (little-endian first, then big-endian), then scans the whole
/// buffer for the first `RIFX`/`XFIR` signature.
pub fn locate_movie(data: &[u8]) -> Option<usize> {
    if is_magic(data) {
        return Some(0);
    }

    if let Some(marker) = data.get(..4)
        && PROJECTOR_MARKERS.iter().any(|m| m.as_slice() == marker)
    {
        let raw: [u8; 4] = data.get(4..8)?.try_into().ok()?;
        let little = u32::from_le_bytes(raw);
        if magic_at(data, little) {
            return usize::try_from(little).ok();
        }
        let big = u32::from_be_bytes(raw);
        if magic_at(data, big) {
            return usize::try_from(big).ok();
        }
        return None;
    }

    data.windows(4).position(is_magic)
}
