//! `KEY*` parent/child link table
//!
//! Resources that belong to another resource (a bitmap to its cast member,
//! a cast table to its movie) are tied together by the `KEY*` chunk. Each
//! record names the owned child, its owner and the child's tag. Records are
//! stored in the container byte order.

use crate::fourcc::FourCC;
use crate::reader::{ByteReader, Endianness, ReadError};
use binrw::BinRead;
use std::collections::HashMap;
use thiserror::Error;

/// Smallest record that holds a link
const KEY_ENTRY_SIZE: u16 = 12;

/// Errors raised while parsing a `KEY*` payload
#[derive(Debug, Error)]
pub enum KeyTableError {
    /// Declared record size cannot hold a link
    #[error("KEY* entry size {0} is shorter than 12 bytes")]
    EntryTooShort(u16),

    /// Truncated table
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Result type for key table operations
pub type KeyTableResult<T> = Result<T, KeyTableError>;

/// One ownership link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead)]
pub struct ParentLink {
    /// Owned resource id
    pub child_id: u32,
    /// Owning resource id
    pub parent_id: u32,
    /// Tag of the owned resource
    #[br(map = |raw: u32| FourCC(raw))]
    pub tag: FourCC,
}

/// Decoded `KEY*` table with lookups in both directions
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Vec<ParentLink>,
    by_child: HashMap<u32, usize>,
    by_parent: HashMap<u32, Vec<usize>>,
}

impl LinkTable {
    /// Parse a `KEY*` payload
    pub fn parse(payload: &[u8], endian: Endianness) -> KeyTableResult<Self> {
        let mut reader = ByteReader::new(payload, endian);
        let entry_size = reader.read_u16()?;
        let _entry_size2 = reader.read_u16()?;
        let _capacity = reader.read_u32()?;
        let used = reader.read_u32()?;

        if entry_size < KEY_ENTRY_SIZE {
            return Err(KeyTableError::EntryTooShort(entry_size));
        }

        let mut links = Vec::with_capacity(used.min(0x1_0000) as usize);
        for _ in 0..used {
            links.push(reader.read_record::<ParentLink>(entry_size as usize)?);
        }
        Ok(Self::from_links(links))
    }

    /// Build the lookups over links in file order
    ///
    /// A child listed more than once keeps its first parent; every link
    /// stays visible through [`LinkTable::iter`] and
    /// [`LinkTable::children_of`].
    pub fn from_links(links: Vec<ParentLink>) -> Self {
        let mut by_child = HashMap::with_capacity(links.len());
        let mut by_parent: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, link) in links.iter().enumerate() {
            by_child.entry(link.child_id).or_insert(index);
            by_parent.entry(link.parent_id).or_default().push(index);
        }
        Self {
            links,
            by_child,
            by_parent,
        }
    }

    /// Link naming the owner of `child_id`
    pub fn parent_of(&self, child_id: u32) -> Option<&ParentLink> {
        self.by_child.get(&child_id).map(|&index| &self.links[index])
    }

    /// Links owned by `parent_id`, in file order
    pub fn children_of(&self, parent_id: u32) -> impl Iterator<Item = &ParentLink> {
        self.by_parent
            .get(&parent_id)
            .into_iter()
            .flatten()
            .map(|&index| &self.links[index])
    }

    /// Children of `parent_id` carrying `tag`
    pub fn children_with_tag(
        &self,
        parent_id: u32,
        tag: FourCC,
    ) -> impl Iterator<Item = &ParentLink> {
        self.children_of(parent_id).filter(move |link| link.tag == tag)
    }

    /// All links in file order
    pub fn iter(&self) -> std::slice::Iter<'_, ParentLink> {
        self.links.iter()
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the table has no links
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table(links: &[(u32, u32, &[u8; 4])], endian: Endianness) -> Vec<u8> {
        let u16_bytes = |v: u16| match endian {
            Endianness::Big => v.to_be_bytes(),
            Endianness::Little => v.to_le_bytes(),
        };
        let u32_bytes = |v: u32| match endian {
            Endianness::Big => v.to_be_bytes(),
            Endianness::Little => v.to_le_bytes(),
        };

        let mut out = Vec::new();
        out.extend_from_slice(&u16_bytes(12));
        out.extend_from_slice(&u16_bytes(12));
        out.extend_from_slice(&u32_bytes(links.len() as u32 + 4));
        out.extend_from_slice(&u32_bytes(links.len() as u32));
        for (child, parent, tag) in links {
            out.extend_from_slice(&u32_bytes(*child));
            out.extend_from_slice(&u32_bytes(*parent));
            out.extend_from_slice(&u32_bytes(FourCC::from_bytes(**tag).0));
        }
        out
    }

    #[test]
    fn test_parse_little_endian() {
        let payload = table(&[(5, 1024, b"CAS*"), (7, 5, b"BITD")], Endianness::Little);
        let links = LinkTable::parse(&payload, Endianness::Little).unwrap();

        assert_eq!(links.len(), 2);
        let link = links.parent_of(5).unwrap();
        assert_eq!(link.parent_id, 1024);
        assert_eq!(link.tag, FourCC::CAS_STAR);
        assert_eq!(links.parent_of(7).unwrap().tag, FourCC::from_bytes(*b"BITD"));
        assert!(links.parent_of(1024).is_none());
    }

    #[test]
    fn test_children_lookup() {
        let payload = table(
            &[(7, 5, b"BITD"), (8, 5, b"Thum"), (9, 6, b"BITD")],
            Endianness::Big,
        );
        let links = LinkTable::parse(&payload, Endianness::Big).unwrap();

        let children: Vec<_> = links.children_of(5).map(|l| l.child_id).collect();
        assert_eq!(children, vec![7, 8]);
        let bitmaps: Vec<_> = links
            .children_with_tag(5, FourCC::from_bytes(*b"BITD"))
            .map(|l| l.child_id)
            .collect();
        assert_eq!(bitmaps, vec![7]);
        assert_eq!(links.children_of(42).count(), 0);
    }

    #[test]
    fn test_first_parent_wins() {
        let payload = table(&[(7, 5, b"BITD"), (7, 6, b"BITD")], Endianness::Big);
        let links = LinkTable::parse(&payload, Endianness::Big).unwrap();
        assert_eq!(links.parent_of(7).unwrap().parent_id, 5);
        assert_eq!(links.iter().count(), 2);
        assert_eq!(links.children_of(6).count(), 1);
    }

    #[test]
    fn test_truncated_table() {
        let payload = table(&[(7, 5, b"BITD")], Endianness::Big);
        assert!(matches!(
            LinkTable::parse(&payload[..payload.len() - 1], Endianness::Big),
            Err(KeyTableError::Read(_))
        ));
    }

    #[test]
    fn test_entry_size_too_small() {
        let mut payload = table(&[], Endianness::Big);
        payload[..2].copy_from_slice(&8u16.to_be_bytes());
        assert!(matches!(
            LinkTable::parse(&payload, Endianness::Big),
            Err(KeyTableError::EntryTooShort(8))
        ));
    }

    #[test]
    fn test_empty_table() {
        let links = LinkTable::parse(&table(&[], Endianness::Big), Endianness::Big).unwrap();
        assert!(links.is_empty());
        assert!(links.parent_of(0).is_none());
    }
}
