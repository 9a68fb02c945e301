//! Cast tables (`CAS*`) and cast member headers (`CASt`)
//!
//! A `CAS*` payload is a packed array of big-endian resource ids, one per
//! cast slot; zero marks an empty slot. Each id names a `CASt` resource
//! whose payload starts with a 12-byte big-endian header followed by the
//! info block (which carries the member name) and the type-specific data.
//! Both structures are big-endian even in little-endian containers.

mod error;
mod name;

pub use error::{CastError, CastResult};
pub use name::{extract_member_name, scan_pascal_string};

use crate::reader::{ByteReader, Endianness};
use binrw::BinRead;
use serde::Serialize;

/// Size of the `CASt` header
pub const CAST_MEMBER_HEADER_SIZE: usize = 12;

/// Kind of a cast member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberType {
    /// Bitmap image
    Bitmap,
    /// Film loop
    FilmLoop,
    /// Editable text field
    Field,
    /// Color palette
    Palette,
    /// QuickDraw picture
    Picture,
    /// Sound sample
    Sound,
    /// Push button, check box or radio button
    Button,
    /// Vector shape
    Shape,
    /// Linked movie
    Movie,
    /// Digital video
    DigitalVideo,
    /// Lingo script
    Script,
    /// Rich text
    Text,
    /// OLE object
    Ole,
    /// Transition
    Transition,
    /// Xtra-defined member
    Xtra,
    /// Unrecognized or undecodable member
    Unknown,
}

impl MemberType {
    /// Map the on-disk type code
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Bitmap,
            2 => Self::FilmLoop,
            3 => Self::Field,
            4 => Self::Palette,
            5 => Self::Picture,
            6 => Self::Sound,
            7 => Self::Button,
            8 => Self::Shape,
            9 => Self::Movie,
            10 => Self::DigitalVideo,
            11 => Self::Script,
            12 => Self::Text,
            13 => Self::Ole,
            14 => Self::Transition,
            15 => Self::Xtra,
            _ => Self::Unknown,
        }
    }
}

/// A populated slot of a cast table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastSlot {
    /// Position in the table
    pub slot_index: u32,
    /// Resource id of the member's `CASt`
    pub resource_id: u32,
}

/// Decoded `CAS*` payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CastTable {
    /// Number of slots, populated or not
    pub entry_count: u32,
    /// Populated slots in table order
    pub slots: Vec<CastSlot>,
}

impl CastTable {
    /// Decode a `CAS*` payload
    ///
    /// Trailing bytes that do not form a whole slot are ignored.
    pub fn parse(payload: &[u8]) -> Self {
        let entry_count = payload.len() / 4;
        let slots = payload
            .chunks_exact(4)
            .enumerate()
            .filter_map(|(index, raw)| {
                let resource_id = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
                (resource_id != 0).then_some(CastSlot {
                    slot_index: index as u32,
                    resource_id,
                })
            })
            .collect();
        Self {
            entry_count: entry_count as u32,
            slots,
        }
    }
}

/// Fixed `CASt` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct CastMemberHeader {
    /// Raw member type code
    pub member_type: u32,
    /// Length of the info block
    pub info_length: u32,
    /// Length of the type-specific data
    pub specific_length: u32,
}

/// Decoded `CASt` header, info block and member name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastMember<'a> {
    /// Header fields as stored
    pub header: CastMemberHeader,
    /// Decoded member type
    pub member_type: MemberType,
    /// Info block, clamped to the bytes present
    pub info: &'a [u8],
    /// Type-specific data, clamped to the bytes present
    pub specific: &'a [u8],
    /// Name recovered from the info block, empty when none
    pub name: String,
}

impl<'a> CastMember<'a> {
    /// Decode a `CASt` payload
    pub fn parse(payload: &'a [u8]) -> CastResult<Self> {
        if payload.len() < CAST_MEMBER_HEADER_SIZE {
            return Err(CastError::TruncatedHeader(payload.len()));
        }

        let mut reader = ByteReader::new(payload, Endianness::Big);
        let header: CastMemberHeader = reader.read_record(CAST_MEMBER_HEADER_SIZE)?;

        let info_length = (header.info_length as usize).min(reader.remaining());
        let info = reader.read_bytes(info_length)?;
        let specific_length = (header.specific_length as usize).min(reader.remaining());
        let specific = reader.read_bytes(specific_length)?;

        Ok(Self {
            header,
            member_type: MemberType::from_code(header.member_type),
            info,
            specific,
            name: extract_member_name(info),
        })
    }
}
