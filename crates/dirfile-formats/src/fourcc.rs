//! Four character codes used as chunk and resource tags

use serde::{Serialize, Serializer};
use std::fmt;

/// A four character chunk tag
///
/// The inner value holds the characters in reading order, most significant
/// byte first, so `FourCC::from_bytes(*b"mmap")` compares equal to a tag
/// read from either a big-endian `RIFX` or a little-endian `XFIR` file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub u32);

impl FourCC {
    /// Big-endian container magic
    pub const RIFX: Self = Self::from_bytes(*b"RIFX");
    /// Little-endian container magic (as it appears on disk)
    pub const XFIR: Self = Self::from_bytes(*b"XFIR");

    /// Director 4+ movie codec
    pub const MV93: Self = Self::from_bytes(*b"MV93");
    /// Director cast codec
    pub const MC95: Self = Self::from_bytes(*b"MC95");
    /// Macintosh classic codec
    pub const APPL: Self = Self::from_bytes(*b"APPL");
    /// Afterburner movie codec
    pub const FGDM: Self = Self::from_bytes(*b"FGDM");
    /// Afterburner cast codec
    pub const FGDC: Self = Self::from_bytes(*b"FGDC");

    /// Initial map chunk
    pub const IMAP: Self = Self::from_bytes(*b"imap");
    /// Memory map chunk
    pub const MMAP: Self = Self::from_bytes(*b"mmap");
    /// Parent/child key table
    pub const KEY_STAR: Self = Self::from_bytes(*b"KEY*");
    /// Unused memory map slot
    pub const FREE: Self = Self::from_bytes(*b"free");
    /// Discarded memory map slot
    pub const JUNK: Self = Self::from_bytes(*b"junk");

    /// Afterburner file version chunk
    pub const FVER: Self = Self::from_bytes(*b"Fver");
    /// Afterburner compression descriptor chunk
    pub const FCDR: Self = Self::from_bytes(*b"Fcdr");
    /// Afterburner map chunk
    pub const ABMP: Self = Self::from_bytes(*b"ABMP");
    /// Afterburner initial load segment chunk
    pub const FGEI: Self = Self::from_bytes(*b"FGEI");

    /// Cast table
    pub const CAS_STAR: Self = Self::from_bytes(*b"CAS*");
    /// Cast member
    pub const CAST: Self = Self::from_bytes(*b"CASt");

    /// Build a tag from its characters in reading order
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    /// Characters in reading order
    pub const fn as_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Tag with its byte order reversed
    pub const fn swapped(self) -> Self {
        Self(self.0.swap_bytes())
    }

    /// Whether the tag marks an unused memory map slot
    pub fn is_free_or_junk(self) -> bool {
        self == Self::FREE || self == Self::JUNK
    }

    /// Tag rendered for use in file names, with unsafe characters replaced
    pub fn to_file_stem(self) -> String {
        self.as_bytes()
            .iter()
            .map(|&b| match b {
                b'*' => '_',
                b if b.is_ascii_alphanumeric() => b as char,
                _ => '_',
            })
            .collect()
    }
}

impl From<u32> for FourCC {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.as_bytes() {
            if (0x20..=0x7E).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{self}\")")
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
