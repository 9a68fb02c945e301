//! Afterburner compression descriptors and zlib inflation

use super::error::{AfterburnerError, AfterburnerResult};
use binrw::BinRead;
use flate2::read::ZlibDecoder;
use std::fmt;
use std::io::Read;

/// Default upper bound for a single inflated buffer (256 MB)
pub const MAX_INFLATED_SIZE: usize = 256 * 1024 * 1024;

/// Compression identifier as stored in `Fcdr`
#[derive(Clone, Copy, PartialEq, Eq, Hash, BinRead)]
pub struct CompressionGuid {
    /// First group
    pub data1: u32,
    /// Second group
    pub data2: u16,
    /// Third group
    pub data3: u16,
    /// Remaining eight bytes
    pub data4: [u8; 8],
}

impl CompressionGuid {
    /// Standard zlib compression
    pub const ZLIB: Self = Self::new(
        0xAC99_E904,
        0x0070,
        0x0B36,
        [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x77, 0x3A],
    );
    /// Stored without compression
    pub const NONE: Self = Self::new(
        0xAC99_982E,
        0x005D,
        0x0D50,
        [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x77, 0x3A],
    );
    /// Sound compression (payload passed through)
    pub const SOUND: Self = Self::new(
        0x7204_A889,
        0xAFD0,
        0x11CF,
        [0xA2, 0x22, 0x00, 0xA0, 0x24, 0x53, 0x44, 0x4C],
    );
    /// Font map substitution
    pub const FONT_MAP: Self = Self::new(
        0x8A46_79A1,
        0x3720,
        0x11D0,
        [0x92, 0x23, 0x00, 0xA0, 0xC9, 0x08, 0x68, 0xB1],
    );

    /// Build an identifier from its groups
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Classify the identifier
    pub fn kind(&self) -> CompressionKind {
        match *self {
            Self::ZLIB => CompressionKind::Zlib,
            Self::NONE => CompressionKind::Uncompressed,
            Self::SOUND => CompressionKind::Sound,
            Self::FONT_MAP => CompressionKind::FontMap,
            _ => CompressionKind::Unknown,
        }
    }
}

impl fmt::Display for CompressionGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{}-{}",
            self.data1,
            self.data2,
            self.data3,
            hex::encode_upper(&self.data4[..2]),
            hex::encode_upper(&self.data4[2..])
        )
    }
}

impl fmt::Debug for CompressionGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressionGuid({self})")
    }
}

/// How a segment's stored bytes are turned into its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionKind {
    /// zlib stream
    Zlib,
    /// Stored as-is
    Uncompressed,
    /// Sound codec, stored bytes are the payload
    Sound,
    /// Font map substitution, not decodable from the file alone
    FontMap,
    /// Unrecognized identifier
    Unknown,
}

/// One entry of the `Fcdr` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionDescriptor {
    /// Position in the table, referenced by `ABMP` entries
    pub index: u32,
    /// Identifier
    pub guid: CompressionGuid,
    /// Human readable name
    pub name: String,
    /// Classification of `guid`
    pub kind: CompressionKind,
}

/// Inflate a zlib stream
///
/// With `expected` set the output must be exactly that long; inflation
/// stops as soon as it produces more. Output beyond `limit` is rejected
/// either way.
pub fn inflate(data: &[u8], expected: Option<usize>, limit: usize) -> AfterburnerResult<Vec<u8>> {
    let cap = match expected {
        Some(size) if size > limit => return Err(AfterburnerError::TooLarge { size, limit }),
        Some(size) => size,
        None => limit,
    };

    let mut decoder = ZlibDecoder::new(data);
    let mut inflated = Vec::with_capacity(initial_capacity(data.len(), expected, cap));

    // Read in blocks so oversized streams stop early
    let mut buffer = [0u8; 8192];
    loop {
        let read = decoder
            .read(&mut buffer)
            .map_err(|e| AfterburnerError::Inflate(e.to_string()))?;
        if read == 0 {
            break;
        }

        if inflated.len() + read > cap {
            let actual = inflated.len() + read;
            return Err(match expected {
                Some(expected) => AfterburnerError::LengthMismatch { expected, actual },
                None => AfterburnerError::TooLarge {
                    size: actual,
                    limit,
                },
            });
        }

        inflated.extend_from_slice(&buffer[..read]);
    }

    if let Some(expected) = expected
        && inflated.len() != expected
    {
        return Err(AfterburnerError::LengthMismatch {
            expected,
            actual: inflated.len(),
        });
    }

    Ok(inflated)
}

/// Starting buffer size for an inflation
///
/// Declared sizes are untrusted, so the buffer starts at a small multiple
/// of the stored size and grows with the output.
fn initial_capacity(stored: usize, expected: Option<usize>, cap: usize) -> usize {
    expected
        .unwrap_or(usize::MAX)
        .min(stored.saturating_mul(4))
        .min(cap)
}
