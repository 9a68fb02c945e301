//! Afterburner (compressed) chunk directory
//!
//! Afterburner files replace `imap`/`mmap` with four control chunks that
//! follow the container header, each a tag and a variable-length size:
//!
//! - `Fver`: map version and an optional build string
//! - `Fcdr`: zlib-compressed table of compression identifiers
//! - `ABMP`: zlib-compressed resource map (id, offset, sizes, compression, tag)
//! - `FGEI`: start of the segment body; resource 2, the initial load
//!   segment (ILS), holds the small resources that are needed at startup
//!
//! Resources with an offset of `-1` live inside the ILS. All other
//! resources are stored at `body_offset + offset` and inflated on demand.

mod compression;
mod error;

pub use compression::{
    CompressionDescriptor, CompressionGuid, CompressionKind, MAX_INFLATED_SIZE, inflate,
};
pub use error::{AfterburnerError, AfterburnerResult};

use crate::fourcc::FourCC;
use crate::reader::{ByteReader, Endianness};
use crate::rifx::HEADER_SIZE;
use std::collections::HashMap;
use std::ops::Range;

/// Resource id of the initial load segment
pub const ILS_RESOURCE_ID: u32 = 2;

/// `Fver` version from which two extra varints follow the version
const FVER_EXTENDED: u32 = 0x401;

/// `Fver` version from which a build string follows
const FVER_WITH_BUILD: u32 = 0x501;

/// One `ABMP` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Resource id
    pub id: u32,
    /// Offset relative to the segment body, `-1` when stored in the ILS
    pub offset: i32,
    /// Stored size
    pub compressed_length: u32,
    /// Size after decompression
    pub uncompressed_length: u32,
    /// Index into the `Fcdr` table
    pub compression_index: u32,
    /// How the stored bytes are decoded
    pub compression: CompressionKind,
    /// Resource tag
    pub tag: FourCC,
}

impl SegmentDescriptor {
    /// Whether the payload lives in the initial load segment
    pub const fn is_inline(&self) -> bool {
        self.offset < 0
    }
}

/// Inflated initial load segment, split into per-resource ranges
#[derive(Debug, Clone, Default)]
pub struct InitialLoadSegment {
    /// Inflated ILS bytes
    pub data: Vec<u8>,
    /// Range of each resource's payload inside `data`
    pub ranges: HashMap<u32, Range<usize>>,
}

impl InitialLoadSegment {
    /// Payload of an ILS resident resource
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        self.ranges.get(&id).map(|range| &self.data[range.clone()])
    }

    /// Whether the ILS carries the resource
    pub fn contains(&self, id: u32) -> bool {
        self.ranges.contains_key(&id)
    }

    /// Number of resources in the ILS
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the ILS is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn split(data: Vec<u8>, segments: &[SegmentDescriptor]) -> Self {
        let lengths: HashMap<u32, usize> = segments
            .iter()
            .map(|s| (s.id, s.compressed_length as usize))
            .collect();

        let mut ranges = HashMap::new();
        let mut reader = ByteReader::new(&data, Endianness::Big);
        while !reader.is_at_end() {
            let Ok(id) = reader.read_varint() else {
                break;
            };
            let Some(&length) = lengths.get(&id) else {
                break;
            };
            let start = reader.position();
            if reader.skip(length).is_err() {
                break;
            }
            ranges.insert(id, start..start + length);
        }

        Self { data, ranges }
    }
}

/// Parsed Afterburner control chunks
#[derive(Debug, Clone)]
pub struct AfterburnerMap {
    /// `Fver` version number
    pub version: u32,
    /// Build string, present from version 0x501
    pub build: Option<String>,
    /// `Fcdr` table
    pub compressions: Vec<CompressionDescriptor>,
    /// `ABMP` entries in file order
    pub segments: Vec<SegmentDescriptor>,
    /// Absolute offset that segment offsets are relative to
    pub body_offset: usize,
    /// Resources stored inline
    pub initial_load_segment: InitialLoadSegment,
}

struct ControlChunk<'a> {
    body: ByteReader<'a>,
}

fn read_control_chunk<'a>(
    reader: &mut ByteReader<'a>,
    expected: FourCC,
) -> AfterburnerResult<ControlChunk<'a>> {
    let offset = reader.position();
    let found = reader.read_fourcc()?;
    if found != expected {
        return Err(AfterburnerError::UnexpectedChunk {
            expected,
            found,
            offset,
        });
    }
    let length = reader.read_varint()? as usize;
    let body = ByteReader::new(reader.read_bytes(length)?, reader.endianness());
    Ok(ControlChunk { body })
}

impl AfterburnerMap {
    /// Parse the control chunks of a movie buffer starting at its container header
    ///
    /// `limit` bounds every buffer inflated while parsing.
    pub fn parse(data: &[u8], endian: Endianness, limit: usize) -> AfterburnerResult<Self> {
        let mut reader = ByteReader::new(data, endian);
        reader.seek(HEADER_SIZE)?;

        let fver = read_control_chunk(&mut reader, FourCC::FVER)?;
        let (version, build) = Self::read_version(fver)?;

        let fcdr = read_control_chunk(&mut reader, FourCC::FCDR)?;
        let compressions = Self::read_compressions(fcdr, endian, limit)?;

        let abmp = read_control_chunk(&mut reader, FourCC::ABMP)?;
        let segments = Self::read_segments(abmp, &compressions, endian, limit)?;

        // FGEI carries no meaningful length; its body runs to the end of the file
        let fgei_offset = reader.position();
        let tag = reader.read_fourcc()?;
        if tag != FourCC::FGEI {
            return Err(AfterburnerError::UnexpectedChunk {
                expected: FourCC::FGEI,
                found: tag,
                offset: fgei_offset,
            });
        }
        reader.read_varint()?;
        let body_offset = reader.position();

        let ils = segments
            .iter()
            .find(|s| s.id == ILS_RESOURCE_ID)
            .ok_or(AfterburnerError::MissingInitialLoadSegment)?;
        let initial_load_segment = if ils.compressed_length == 0 {
            InitialLoadSegment::default()
        } else {
            let packed = reader.read_bytes(ils.compressed_length as usize)?;
            let inflated = inflate(packed, Some(ils.uncompressed_length as usize), limit)?;
            InitialLoadSegment::split(inflated, &segments)
        };

        Ok(Self {
            version,
            build,
            compressions,
            segments,
            body_offset,
            initial_load_segment,
        })
    }

    fn read_version(chunk: ControlChunk<'_>) -> AfterburnerResult<(u32, Option<String>)> {
        let mut body = chunk.body;
        let version = body.read_varint()?;
        if version >= FVER_EXTENDED {
            body.read_varint()?;
            body.read_varint()?;
        }
        let build = if version >= FVER_WITH_BUILD {
            Some(body.read_pascal_string()?)
        } else {
            None
        };
        Ok((version, build))
    }

    fn read_compressions(
        chunk: ControlChunk<'_>,
        endian: Endianness,
        limit: usize,
    ) -> AfterburnerResult<Vec<CompressionDescriptor>> {
        let inflated = inflate(chunk.body.data(), None, limit)?;
        let mut reader = ByteReader::new(&inflated, endian);

        let count = reader.read_u16()?;
        let mut guids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            guids.push(reader.read_record::<CompressionGuid>(16)?);
        }

        let mut descriptors = Vec::with_capacity(guids.len());
        for (index, guid) in guids.into_iter().enumerate() {
            descriptors.push(CompressionDescriptor {
                index: index as u32,
                guid,
                name: reader.read_cstring()?,
                kind: guid.kind(),
            });
        }
        Ok(descriptors)
    }

    fn read_segments(
        chunk: ControlChunk<'_>,
        compressions: &[CompressionDescriptor],
        endian: Endianness,
        limit: usize,
    ) -> AfterburnerResult<Vec<SegmentDescriptor>> {
        let mut body = chunk.body;
        let mode = body.read_varint()?;
        let expected = body.read_varint()? as usize;
        let packed = body.read_bytes(body.remaining())?;

        let inflated;
        let map = if mode == 0 {
            packed
        } else {
            inflated = inflate(packed, Some(expected), limit)?;
            &inflated[..]
        };

        let mut reader = ByteReader::new(map, endian);
        reader.read_varint()?;
        reader.read_varint()?;
        let count = reader.read_varint()?;

        let mut segments = Vec::with_capacity(count.min(0x1_0000) as usize);
        for _ in 0..count {
            let id = reader.read_varint()?;
            let offset = reader.read_varint()? as i32;
            let compressed_length = reader.read_varint()?;
            let uncompressed_length = reader.read_varint()?;
            let compression_index = reader.read_varint()?;
            let tag = reader.read_fourcc()?;
            let compression = compressions
                .get(compression_index as usize)
                .map_or(CompressionKind::Unknown, |c| c.kind);

            segments.push(SegmentDescriptor {
                id,
                offset,
                compressed_length,
                uncompressed_length,
                compression_index,
                compression,
                tag,
            });
        }
        Ok(segments)
    }

    /// Absolute byte range of a stored (non-inline) segment
    pub fn stored_range(&self, segment: &SegmentDescriptor) -> AfterburnerResult<Range<usize>> {
        let offset = usize::try_from(segment.offset)
            .map_err(|_| AfterburnerError::NotStored(segment.id))?;
        let start = self.body_offset + offset;
        Ok(start..start + segment.compressed_length as usize)
    }

    /// Descriptor for a resource id
    pub fn segment(&self, id: u32) -> Option<&SegmentDescriptor> {
        self.segments.iter().find(|s| s.id == id)
    }
}
