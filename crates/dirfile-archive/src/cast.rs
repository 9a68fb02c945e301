//! Cast library decoding
//!
//! Resolves a `CAS*` table and the `CASt` member it points at for every
//! populated slot. A member that cannot be loaded or decoded is kept as
//! [`MemberType::Unknown`] with an empty name, so one bad member never
//! hides the rest of the library.

use crate::archive::Archive;
use crate::{ArchiveError, Result};
use dirfile_formats::FourCC;
use dirfile_formats::cast::{CastMember, CastSlot, CastTable, MemberType};
use serde::Serialize;
use tracing::{debug, warn};

/// One populated slot of a cast library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastMemberSlot {
    /// Position in the cast table
    pub slot_index: u32,
    /// Resource id of the member's `CASt`
    pub resource_id: u32,
    /// Decoded member type
    pub member_type: MemberType,
    /// Member name, empty when none could be recovered
    pub name: String,
}

/// Decoded cast library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastLibrary {
    /// Resource id of the `CAS*`
    pub resource_id: u32,
    /// Owner of the `CAS*` according to `KEY*`
    pub parent_id: Option<u32>,
    /// Number of slots in the table, populated or not
    pub entry_count: u32,
    /// Populated slots in table order
    pub members: Vec<CastMemberSlot>,
}

impl CastLibrary {
    /// Member in a given slot
    pub fn member_at(&self, slot_index: u32) -> Option<&CastMemberSlot> {
        self.members.iter().find(|m| m.slot_index == slot_index)
    }

    /// First member with a given name
    pub fn member_named(&self, name: &str) -> Option<&CastMemberSlot> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Decode the cast library stored in resource `id`
pub fn decode_cast_library(archive: &Archive, id: u32) -> Result<CastLibrary> {
    let entry = archive.get_entry(id)?;
    if entry.tag != FourCC::CAS_STAR {
        debug!("Decoding resource {id} ('{}') as a cast table", entry.tag);
    }
    let payload = archive.load_payload(entry)?;
    let table = CastTable::parse(&payload);

    let members = table
        .slots
        .iter()
        .map(|slot| decode_member(archive, slot))
        .collect();

    Ok(CastLibrary {
        resource_id: id,
        parent_id: archive.parent_of(id),
        entry_count: table.entry_count,
        members,
    })
}

/// Decode every `CAS*` resource in directory order
///
/// A library whose table cannot be loaded is returned as an error in place.
pub fn cast_libraries(archive: &Archive) -> Vec<Result<CastLibrary>> {
    archive
        .entries_by_tag(FourCC::CAS_STAR)
        .map(|entry| decode_cast_library(archive, entry.id))
        .collect()
}

fn decode_member(archive: &Archive, slot: &CastSlot) -> CastMemberSlot {
    let decoded = archive.load(slot.resource_id).and_then(|payload| {
        CastMember::parse(&payload)
            .map(|member| (member.member_type, member.name))
            .map_err(|e| ArchiveError::corrupt(slot.resource_id, e))
    });

    let (member_type, name) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(
                "Cast slot {} (resource {}) decoded as Unknown: {e}",
                slot.slot_index, slot.resource_id
            );
            (MemberType::Unknown, String::new())
        }
    };

    CastMemberSlot {
        slot_index: slot.slot_index,
        resource_id: slot.resource_id,
        member_type,
        name,
    }
}

impl Archive {
    /// Decode the cast library stored in resource `id`
    pub fn cast_library(&self, id: u32) -> Result<CastLibrary> {
        decode_cast_library(self, id)
    }

    /// Decode every cast library in the container
    pub fn cast_libraries(&self) -> Vec<Result<CastLibrary>> {
        cast_libraries(self)
    }
}
