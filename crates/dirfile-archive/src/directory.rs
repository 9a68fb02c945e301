//! Unified resource directory
//!
//! Both storage layouts are flattened into one list of [`ResourceEntry`]
//! values in directory order, indexed by resource id.

use dirfile_formats::FourCC;
use dirfile_formats::afterburner::{AfterburnerMap, SegmentDescriptor};
use dirfile_formats::classic::ClassicDirectory;
use serde::Serialize;
use std::collections::HashMap;

/// Where a resource's bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StorageKind {
    /// Plain chunk inside the container
    Classic {
        /// Absolute offset of the chunk header
        offset: u32,
        /// Payload length
        length: u32,
    },
    /// Afterburner segment, inline or stored
    AfterburnerSegment {
        /// Offset relative to the segment body, negative when inline
        offset: i32,
        /// Stored size
        compressed_length: u32,
        /// Size after decompression
        uncompressed_length: u32,
    },
}

/// One addressable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    /// Resource id, referenced by `KEY*` and `CAS*`
    pub id: u32,
    /// Resource tag
    pub tag: FourCC,
    /// Storage location
    pub storage: StorageKind,
}

impl ResourceEntry {
    /// Declared payload length
    pub const fn declared_length(&self) -> u32 {
        match self.storage {
            StorageKind::Classic { length, .. } => length,
            StorageKind::AfterburnerSegment {
                uncompressed_length,
                ..
            } => uncompressed_length,
        }
    }

    /// File name used when exporting the resource
    pub fn export_file_name(&self) -> String {
        format!("{}_{:04}.bin", self.tag.to_file_stem(), self.id)
    }
}

impl From<&SegmentDescriptor> for ResourceEntry {
    fn from(segment: &SegmentDescriptor) -> Self {
        Self {
            id: segment.id,
            tag: segment.tag,
            storage: StorageKind::AfterburnerSegment {
                offset: segment.offset,
                compressed_length: segment.compressed_length,
                uncompressed_length: segment.uncompressed_length,
            },
        }
    }
}

/// Resources in directory order with an id index
#[derive(Debug, Clone, Default)]
pub struct ResourceDirectory {
    entries: Vec<ResourceEntry>,
    by_id: HashMap<u32, usize>,
}

impl ResourceDirectory {
    /// Build from entries in directory order; the first entry wins for a repeated id
    pub fn new(entries: Vec<ResourceEntry>) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id).or_insert(index);
        }
        Self { entries, by_id }
    }

    /// Directory of a classic container
    pub fn from_classic(directory: &ClassicDirectory) -> Self {
        Self::new(
            directory
                .entries()
                .map(|entry| ResourceEntry {
                    id: entry.id,
                    tag: entry.tag,
                    storage: StorageKind::Classic {
                        offset: entry.offset,
                        length: entry.length,
                    },
                })
                .collect(),
        )
    }

    /// Directory of an Afterburner container
    pub fn from_afterburner(map: &AfterburnerMap) -> Self {
        Self::new(map.segments.iter().map(ResourceEntry::from).collect())
    }

    /// Entry for a resource id
    pub fn get(&self, id: u32) -> Option<&ResourceEntry> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    /// Entries carrying `tag`, in directory order
    pub fn by_tag(&self, tag: FourCC) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter().filter(move |entry| entry.tag == tag)
    }

    /// All entries in directory order
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
