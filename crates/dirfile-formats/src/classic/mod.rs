//! Classic (uncompressed) chunk directory
//!
//! The `imap` chunk directly after the container header points at the
//! `mmap` chunk, a table of fixed-size records describing every chunk in
//! the file. A record's index in that table is the resource id used by
//! every other structure (`KEY*`, `CAS*`).
//!
//! Each record points at a chunk header (`tag`, `length`) and the payload
//! follows it, so resource payloads are plain slices of the movie buffer.

mod error;

pub use error::{ClassicError, ClassicResult};

use crate::fourcc::FourCC;
use crate::reader::{ByteReader, Endianness};
use crate::rifx::HEADER_SIZE;
use binrw::BinRead;
use std::ops::Range;

/// Size of a chunk header (tag + length)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Mandatory part of the `mmap` header
const MMAP_MIN_HEADER_SIZE: u16 = 12;

/// Bytes of an `mmap` record that are decoded
pub const MMAP_ENTRY_SIZE: u16 = 20;

/// `imap` chunk payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
pub struct InitialMap {
    /// Number of memory maps (always 1)
    pub map_count: u32,
    /// Absolute offset of the `mmap` chunk header
    pub mmap_offset: u32,
    /// Version of the authoring tool that wrote the map
    pub archive_version: u32,
}

/// Fixed part of the `mmap` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryMapHeader {
    /// Size of the header including optional fields
    pub header_size: u16,
    /// Size of each record
    pub entry_size: u16,
    /// Number of record slots in the table
    pub capacity: u32,
    /// Number of slots in use
    pub used: u32,
    /// First slot of the junk list
    pub junk_head: u32,
    /// Second junk list pointer
    pub junk_head2: u32,
    /// First slot of the free list
    pub free_head: u32,
}

/// One `mmap` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
pub struct MemoryMapEntry {
    /// Chunk tag
    #[br(map = |raw: u32| FourCC(raw))]
    pub tag: FourCC,
    /// Payload length (excluding the chunk header)
    pub length: u32,
    /// Absolute offset of the chunk header
    pub offset: u32,
    /// Record flags
    pub flags: u16,
    /// Unused by readers
    pub unknown: u16,
    /// Next slot in the free list
    pub next: i32,
}

impl MemoryMapEntry {
    /// Whether the record describes a real resource
    pub fn is_resource(&self) -> bool {
        self.tag.0 != 0 && !self.tag.is_free_or_junk()
    }

    /// Byte range of the payload inside the movie buffer
    pub fn payload_range(&self) -> Range<usize> {
        let start = self.offset as usize + CHUNK_HEADER_SIZE;
        start..start + self.length as usize
    }
}

/// A resource exposed by the classic directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicEntry {
    /// Resource id (index in the memory map)
    pub id: u32,
    /// Chunk tag
    pub tag: FourCC,
    /// Absolute offset of the chunk header
    pub offset: u32,
    /// Payload length
    pub length: u32,
    /// Record flags
    pub flags: u16,
}

/// Parsed `imap` + `mmap`
#[derive(Debug, Clone)]
pub struct ClassicDirectory {
    /// `imap` contents
    pub initial_map: InitialMap,
    /// `mmap` header
    pub header: MemoryMapHeader,
    /// Every slot of the memory map, indexed by resource id
    pub records: Vec<MemoryMapEntry>,
}

/// Read a chunk header at an absolute offset
pub fn read_chunk_header(
    data: &[u8],
    offset: usize,
    endian: Endianness,
) -> ClassicResult<(FourCC, u32)> {
    let mut reader = ByteReader::new(data, endian);
    reader.seek(offset)?;
    Ok((reader.read_fourcc()?, reader.read_u32()?))
}

fn expect_chunk<'a>(
    data: &'a [u8],
    offset: usize,
    expected: FourCC,
    endian: Endianness,
) -> ClassicResult<ByteReader<'a>> {
    let (found, length) = read_chunk_header(data, offset, endian)?;
    if found != expected {
        return Err(ClassicError::UnexpectedChunk {
            expected,
            found,
            offset,
        });
    }
    let mut reader = ByteReader::new(data, endian);
    reader.seek(offset + CHUNK_HEADER_SIZE)?;
    let payload = reader.read_bytes(length as usize)?;
    Ok(ByteReader::new(payload, endian))
}

impl ClassicDirectory {
    /// Parse the directory of a movie buffer starting at its container header
    pub fn parse(data: &[u8], endian: Endianness) -> ClassicResult<Self> {
        let mut imap = expect_chunk(data, HEADER_SIZE, FourCC::IMAP, endian)?;
        let initial_map: InitialMap = imap.read_record(12)?;

        let mut mmap = expect_chunk(data, initial_map.mmap_offset as usize, FourCC::MMAP, endian)?;
        let header = Self::read_header(&mut mmap)?;

        let mut records = Vec::with_capacity(header.capacity.min(0x1_0000) as usize);
        for _ in 0..header.capacity {
            records.push(mmap.read_record::<MemoryMapEntry>(header.entry_size as usize)?);
        }

        let directory = Self {
            initial_map,
            header,
            records,
        };
        directory.validate(data.len())?;
        Ok(directory)
    }

    fn read_header(reader: &mut ByteReader<'_>) -> ClassicResult<MemoryMapHeader> {
        let header_size = reader.read_u16()?;
        if header_size < MMAP_MIN_HEADER_SIZE {
            return Err(ClassicError::HeaderTooShort(header_size));
        }
        let entry_size = reader.read_u16()?;
        if entry_size < MMAP_ENTRY_SIZE {
            return Err(ClassicError::EntryTooShort(entry_size));
        }

        let mut header = MemoryMapHeader {
            header_size,
            entry_size,
            capacity: reader.read_u32()?,
            used: reader.read_u32()?,
            ..MemoryMapHeader::default()
        };

        let mut optional = (header_size - MMAP_MIN_HEADER_SIZE) as usize;
        for field in [
            &mut header.junk_head,
            &mut header.junk_head2,
            &mut header.free_head,
        ] {
            if optional < 4 {
                break;
            }
            *field = reader.read_u32()?;
            optional -= 4;
        }
        reader.skip(optional)?;
        Ok(header)
    }

    fn validate(&self, buffer_len: usize) -> ClassicResult<()> {
        for entry in self.entries() {
            let end = u64::from(entry.offset) + CHUNK_HEADER_SIZE as u64 + u64::from(entry.length);
            if end > buffer_len as u64 {
                return Err(ClassicError::EntryOutOfBounds {
                    id: entry.id,
                    tag: entry.tag,
                    offset: entry.offset,
                    length: entry.length,
                    buffer_len,
                });
            }
        }
        Ok(())
    }

    /// Resources in id order, skipping `free`/`junk` slots
    pub fn entries(&self) -> impl Iterator<Item = ClassicEntry> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_resource())
            .map(|(id, record)| ClassicEntry {
                id: id as u32,
                tag: record.tag,
                offset: record.offset,
                length: record.length,
                flags: record.flags,
            })
    }

    /// Record for a resource id, if the slot holds a resource
    pub fn get(&self, id: u32) -> Option<&MemoryMapEntry> {
        self.records
            .get(id as usize)
            .filter(|record| record.is_resource())
    }
}
