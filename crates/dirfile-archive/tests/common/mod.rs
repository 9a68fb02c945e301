//! Synthetic container fixtures shared by the integration tests
#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use dirfile_archive::Endianness;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

/// Id of the first resource added to a [`MovieBuilder`]
pub const FIRST_ID: u32 = 3;

/// Compression identifier groups as written in `Fcdr`
pub type Guid = (u32, u16, u16, [u8; 8]);

/// zlib compression, always `Fcdr` entry 0 in the fixtures
pub const ZLIB_GUID: Guid = (
    0xAC99_E904,
    0x0070,
    0x0B36,
    [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x77, 0x3A],
);

/// Stored without compression
pub const NONE_GUID: Guid = (
    0xAC99_982E,
    0x005D,
    0x0D50,
    [0x00, 0x00, 0x08, 0x00, 0x07, 0x37, 0x77, 0x3A],
);

/// Sound codec, stored bytes are the payload
pub const SOUND_GUID: Guid = (
    0x7204_A889,
    0xAFD0,
    0x11CF,
    [0xA2, 0x22, 0x00, 0xA0, 0x24, 0x53, 0x44, 0x4C],
);

/// Font map substitution
pub const FONT_MAP_GUID: Guid = (
    0x8A46_79A1,
    0x3720,
    0x11D0,
    [0x92, 0x23, 0x00, 0xA0, 0xC9, 0x08, 0x68, 0xB1],
);

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_u16(out: &mut Vec<u8>, value: u16, endian: Endianness) {
    match endian {
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32, endian: Endianness) {
    match endian {
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_tag(out: &mut Vec<u8>, tag: [u8; 4], endian: Endianness) {
    put_u32(out, u32::from_be_bytes(tag), endian);
}

fn put_varint(out: &mut Vec<u8>, value: u32) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        groups.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    out.extend(groups.iter().rev());
}

/// Where an Afterburner resource is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inside the initial load segment
    Inline,
    /// Segment after the initial load segment
    Stored,
}

#[derive(Debug, Clone)]
struct Resource {
    tag: [u8; 4],
    payload: Vec<u8>,
    placement: Placement,
    declared_length: Option<u32>,
    compression_index: u32,
}

/// Builds classic and Afterburner containers from a list of resources
///
/// Resource ids start at [`FIRST_ID`] in both layouts (classic ids 0..=2
/// are the container, `imap` and `mmap`; Afterburner id 2 is the initial
/// load segment).
#[derive(Debug, Clone)]
pub struct MovieBuilder {
    resources: Vec<Resource>,
    compressions: Vec<(Guid, &'static str)>,
}

impl Default for MovieBuilder {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            compressions: vec![(ZLIB_GUID, "zlib")],
        }
    }
}

impl MovieBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an `Fcdr` entry and return its index
    ///
    /// Stored resources pointing at a non-zlib entry are written as-is.
    pub fn add_compression(&mut self, guid: Guid, name: &'static str) -> u32 {
        self.compressions.push((guid, name));
        self.compressions.len() as u32 - 1
    }

    fn is_zlib(&self, index: u32) -> bool {
        self.compressions
            .get(index as usize)
            .is_none_or(|(guid, _)| *guid == ZLIB_GUID)
    }

    /// Add a resource and return its id
    pub fn add(&mut self, tag: &[u8; 4], payload: impl Into<Vec<u8>>) -> u32 {
        self.add_placed(tag, payload, Placement::Stored)
    }

    /// Add a resource stored in the Afterburner initial load segment
    pub fn add_inline(&mut self, tag: &[u8; 4], payload: impl Into<Vec<u8>>) -> u32 {
        self.add_placed(tag, payload, Placement::Inline)
    }

    fn add_placed(
        &mut self,
        tag: &[u8; 4],
        payload: impl Into<Vec<u8>>,
        placement: Placement,
    ) -> u32 {
        self.resources.push(Resource {
            tag: *tag,
            payload: payload.into(),
            placement,
            declared_length: None,
            compression_index: 0,
        });
        FIRST_ID + self.resources.len() as u32 - 1
    }

    /// Override the uncompressed length written to `ABMP` for a resource
    pub fn declare_length(&mut self, id: u32, length: u32) {
        self.resources[(id - FIRST_ID) as usize].declared_length = Some(length);
    }

    /// Point a resource at another `Fcdr` entry
    pub fn set_compression_index(&mut self, id: u32, index: u32) {
        self.resources[(id - FIRST_ID) as usize].compression_index = index;
    }

    /// Next id that [`MovieBuilder::add`] will hand out
    pub fn next_id(&self) -> u32 {
        FIRST_ID + self.resources.len() as u32
    }

    /// Classic `imap`/`mmap` container with codec `MV93`
    pub fn build_classic(&self, endian: Endianness) -> Vec<u8> {
        self.build_classic_with_codec(endian, *b"MV93")
    }

    /// Classic container with an explicit codec
    pub fn build_classic_with_codec(&self, endian: Endianness, codec: [u8; 4]) -> Vec<u8> {
        let slots = self.resources.len() + 3;
        let imap_at = 12usize;
        let mmap_at = imap_at + 8 + 12;
        let mmap_len = 24 + slots * 20;
        let mut offset = mmap_at + 8 + mmap_len;

        let mut records = vec![
            (*b"RIFX", 0u32, 0u32),
            (*b"imap", 12, imap_at as u32),
            (*b"mmap", mmap_len as u32, mmap_at as u32),
        ];
        for resource in &self.resources {
            records.push((resource.tag, resource.payload.len() as u32, offset as u32));
            offset += 8 + resource.payload.len();
        }
        let total = (offset - 8) as u32;
        records[0].1 = total;

        let mut out = Vec::with_capacity(offset);
        put_tag(&mut out, *b"RIFX", endian);
        put_u32(&mut out, total, endian);
        put_tag(&mut out, codec, endian);

        put_tag(&mut out, *b"imap", endian);
        put_u32(&mut out, 12, endian);
        put_u32(&mut out, 1, endian);
        put_u32(&mut out, mmap_at as u32, endian);
        put_u32(&mut out, 0x4C7, endian);

        put_tag(&mut out, *b"mmap", endian);
        put_u32(&mut out, mmap_len as u32, endian);
        put_u16(&mut out, 24, endian);
        put_u16(&mut out, 20, endian);
        put_u32(&mut out, slots as u32, endian);
        put_u32(&mut out, slots as u32, endian);
        put_u32(&mut out, u32::MAX, endian);
        put_u32(&mut out, u32::MAX, endian);
        put_u32(&mut out, u32::MAX, endian);
        for (tag, length, offset) in &records {
            put_tag(&mut out, *tag, endian);
            put_u32(&mut out, *length, endian);
            put_u32(&mut out, *offset, endian);
            put_u16(&mut out, 0, endian);
            put_u16(&mut out, 0, endian);
            put_u32(&mut out, 0, endian);
        }

        for resource in &self.resources {
            put_tag(&mut out, resource.tag, endian);
            put_u32(&mut out, resource.payload.len() as u32, endian);
            out.extend_from_slice(&resource.payload);
        }
        out
    }

    /// Afterburner container with codec `FGDM`
    pub fn build_afterburner(&self, endian: Endianness) -> Vec<u8> {
        let mut fcdr = Vec::new();
        put_u16(&mut fcdr, self.compressions.len() as u16, endian);
        for ((data1, data2, data3, data4), _) in &self.compressions {
            put_u32(&mut fcdr, *data1, endian);
            put_u16(&mut fcdr, *data2, endian);
            put_u16(&mut fcdr, *data3, endian);
            fcdr.extend_from_slice(data4);
        }
        for (_, name) in &self.compressions {
            fcdr.extend_from_slice(name.as_bytes());
            fcdr.push(0);
        }
        let fcdr = deflate(&fcdr);

        let mut ils = Vec::new();
        for (index, resource) in self.resources.iter().enumerate() {
            if resource.placement == Placement::Inline {
                put_varint(&mut ils, FIRST_ID + index as u32);
                ils.extend_from_slice(&resource.payload);
            }
        }
        let packed_ils = deflate(&ils);

        let mut body = packed_ils.clone();
        let mut map = Vec::new();
        put_varint(&mut map, 0);
        put_varint(&mut map, 0);
        put_varint(&mut map, self.resources.len() as u32 + 1);

        // (id, offset, stored length, declared length, compression index, tag)
        let entry = |map: &mut Vec<u8>, fields: (u32, u32, u32, u32, u32, [u8; 4])| {
            let (id, offset, stored, declared, compression, tag) = fields;
            put_varint(map, id);
            put_varint(map, offset);
            put_varint(map, stored);
            put_varint(map, declared);
            put_varint(map, compression);
            put_tag(map, tag, endian);
        };
        let ils_lengths = (packed_ils.len() as u32, ils.len() as u32);
        entry(&mut map, (2, 0, ils_lengths.0, ils_lengths.1, 0, *b"ILS "));

        for (index, resource) in self.resources.iter().enumerate() {
            let id = FIRST_ID + index as u32;
            let length = resource.payload.len() as u32;
            let declared = resource.declared_length.unwrap_or(length);
            let compression = resource.compression_index;
            match resource.placement {
                Placement::Inline => entry(
                    &mut map,
                    (id, u32::MAX, length, declared, compression, resource.tag),
                ),
                Placement::Stored => {
                    let stored = if self.is_zlib(compression) {
                        deflate(&resource.payload)
                    } else {
                        resource.payload.clone()
                    };
                    let offset = body.len() as u32;
                    let stored_length = stored.len() as u32;
                    entry(
                        &mut map,
                        (id, offset, stored_length, declared, compression, resource.tag),
                    );
                    body.extend_from_slice(&stored);
                }
            }
        }
        let packed_map = deflate(&map);

        let mut out = Vec::new();
        put_tag(&mut out, *b"RIFX", endian);
        put_u32(&mut out, 0, endian);
        put_tag(&mut out, *b"FGDM", endian);

        let mut fver = Vec::new();
        put_varint(&mut fver, 0x501);
        put_varint(&mut fver, 0x730);
        put_varint(&mut fver, 0);
        fver.push(5);
        fver.extend_from_slice(b"8.5.1");
        put_tag(&mut out, *b"Fver", endian);
        put_varint(&mut out, fver.len() as u32);
        out.extend_from_slice(&fver);

        put_tag(&mut out, *b"Fcdr", endian);
        put_varint(&mut out, fcdr.len() as u32);
        out.extend_from_slice(&fcdr);

        let mut abmp = Vec::new();
        put_varint(&mut abmp, 1);
        put_varint(&mut abmp, map.len() as u32);
        abmp.extend_from_slice(&packed_map);
        put_tag(&mut out, *b"ABMP", endian);
        put_varint(&mut out, abmp.len() as u32);
        out.extend_from_slice(&abmp);

        put_tag(&mut out, *b"FGEI", endian);
        put_varint(&mut out, 0);
        out.extend_from_slice(&body);

        let length = (out.len() - 8) as u32;
        let mut header = Vec::new();
        put_u32(&mut header, length, endian);
        out[4..8].copy_from_slice(&header);
        out
    }
}

/// `KEY*` payload in container byte order
pub fn key_table(links: &[(u32, u32, &[u8; 4])], endian: Endianness) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, 12, endian);
    put_u16(&mut out, 12, endian);
    put_u32(&mut out, links.len() as u32, endian);
    put_u32(&mut out, links.len() as u32, endian);
    for (child, parent, tag) in links {
        put_u32(&mut out, *child, endian);
        put_u32(&mut out, *parent, endian);
        put_tag(&mut out, **tag, endian);
    }
    out
}

/// `CAS*` payload (always big-endian)
pub fn cast_table(slots: &[u32]) -> Vec<u8> {
    slots.iter().flat_map(|id| id.to_be_bytes()).collect()
}

/// `CASt` payload (always big-endian) whose info block names the member
pub fn cast_member(member_type: u32, name: &str) -> Vec<u8> {
    let mut info = Vec::new();
    let items: [&[u8]; 3] = [b"\x00\x00", &pascal(name), b"\x00"];
    let mut offsets = Vec::new();
    let mut body = Vec::new();
    for item in items {
        offsets.push(body.len() as u32);
        body.extend_from_slice(item);
    }
    info.extend_from_slice(&0x14u32.to_be_bytes());
    info.extend_from_slice(&(offsets.len() as u16).to_be_bytes());
    info.extend_from_slice(&(body.len() as u32).to_be_bytes());
    for offset in offsets {
        info.extend_from_slice(&offset.to_be_bytes());
    }
    info.extend_from_slice(&body);

    let specific = b"specific data";
    let mut out = Vec::new();
    out.extend_from_slice(&member_type.to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(&(specific.len() as u32).to_be_bytes());
    out.extend_from_slice(&info);
    out.extend_from_slice(specific);
    out
}

fn pascal(text: &str) -> Vec<u8> {
    let mut out = vec![text.len() as u8];
    out.extend_from_slice(text.as_bytes());
    out
}

/// Offset of `mmap` record `id` in a classic fixture
pub fn classic_record_offset(id: u32) -> usize {
    12 + 20 + 8 + 24 + id as usize * 20
}

/// Offset of the chunk header of resource `id` in a classic fixture
pub fn classic_chunk_offset(movie: &[u8], id: u32, endian: Endianness) -> usize {
    let at = classic_record_offset(id) + 8;
    let raw: [u8; 4] = movie[at..at + 4].try_into().unwrap();
    match endian {
        Endianness::Big => u32::from_be_bytes(raw) as usize,
        Endianness::Little => u32::from_le_bytes(raw) as usize,
    }
}
