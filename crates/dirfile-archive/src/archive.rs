//! Resource resolution facade
//!
//! Opening an [`Archive`] parses the whole directory eagerly: the container
//! header, the classic `mmap` or the Afterburner map with its initial load
//! segment, and the `KEY*` link table. Any failure there aborts the open.
//! Payloads are resolved lazily and failures are scoped to the resource.

use crate::cache::{CacheStats, SegmentCache};
use crate::config::ArchiveConfig;
use crate::directory::{ResourceDirectory, ResourceEntry, StorageKind};
use crate::{ArchiveError, Result};
use bytes::Bytes;
use dirfile_formats::afterburner::{
    AfterburnerError, AfterburnerMap, CompressionDescriptor, CompressionKind, SegmentDescriptor,
    inflate,
};
use dirfile_formats::classic::{CHUNK_HEADER_SIZE, ClassicDirectory, read_chunk_header};
use dirfile_formats::keytable::{LinkTable, ParentLink};
use dirfile_formats::rifx::{self, RifxHeader};
use dirfile_formats::{ByteReader, Endianness, FourCC, StorageLayout};
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, trace};

/// Layout-specific state
#[derive(Debug)]
enum Backend {
    Classic(ClassicDirectory),
    Afterburner(AfterburnerStore),
}

/// Afterburner map with its inline bytes and inflation cache
#[derive(Debug)]
struct AfterburnerStore {
    map: AfterburnerMap,
    segments: HashMap<u32, SegmentDescriptor>,
    ils: Bytes,
    ils_ranges: HashMap<u32, Range<usize>>,
    cache: SegmentCache,
}

/// A resource written out by [`Archive::export_resources`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedResource {
    /// Resource id
    pub id: u32,
    /// Resource tag
    pub tag: FourCC,
    /// Suggested file name, `{tag}_{id:04}.bin`
    pub file_name: String,
    /// Payload bytes
    pub bytes: Bytes,
}

/// An opened movie or cast container
#[derive(Debug)]
pub struct Archive {
    data: Bytes,
    movie_offset: usize,
    header: RifxHeader,
    config: ArchiveConfig,
    directory: ResourceDirectory,
    links: LinkTable,
    backend: Backend,
}

impl Archive {
    /// Open a container with the default configuration
    pub fn open(data: impl Into<Bytes>) -> Result<Self> {
        Self::open_with_config(data, ArchiveConfig::default())
    }

    /// Read and open a container file
    pub fn open_path<P: AsRef<Path>>(path: P, config: ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading container {}", path.display());
        let data = std::fs::read(path)?;
        Self::open_with_config(data, config)
    }

    /// Open a container
    pub fn open_with_config(data: impl Into<Bytes>, config: ArchiveConfig) -> Result<Self> {
        let data: Bytes = data.into();

        let movie_offset = if config.locate_embedded_movie {
            rifx::locate_movie(&data).unwrap_or(0)
        } else {
            0
        };
        if movie_offset > 0 {
            debug!("Movie embedded at offset {movie_offset}");
        }
        let data = data.slice(movie_offset..);

        let header = rifx::detect(&data)?;
        let endian = header.endianness;

        let (directory, backend) = match header.layout {
            StorageLayout::Classic => {
                let classic = ClassicDirectory::parse(&data, endian)?;
                (
                    ResourceDirectory::from_classic(&classic),
                    Backend::Classic(classic),
                )
            }
            StorageLayout::Afterburner => {
                let mut map = AfterburnerMap::parse(&data, endian, config.max_inflated_size)?;
                debug!(
                    "Afterburner map version 0x{:X} ({}), {} segments, {} inline",
                    map.version,
                    map.build.as_deref().unwrap_or("no build"),
                    map.segments.len(),
                    map.initial_load_segment.len()
                );
                let ils = Bytes::from(std::mem::take(&mut map.initial_load_segment.data));
                let ils_ranges = std::mem::take(&mut map.initial_load_segment.ranges);
                let mut segments = HashMap::with_capacity(map.segments.len());
                for segment in &map.segments {
                    segments.entry(segment.id).or_insert(*segment);
                }
                (
                    ResourceDirectory::from_afterburner(&map),
                    Backend::Afterburner(AfterburnerStore {
                        map,
                        segments,
                        ils,
                        ils_ranges,
                        cache: SegmentCache::new(),
                    }),
                )
            }
        };

        let mut archive = Self {
            data,
            movie_offset,
            header,
            config,
            directory,
            links: LinkTable::default(),
            backend,
        };
        archive.links = archive.read_links()?;

        info!(
            "Opened {:?} container ({}, {:?}): {} resources, {} links",
            header.layout,
            header.codec,
            endian,
            archive.directory.len(),
            archive.links.len()
        );
        Ok(archive)
    }

    fn read_links(&self) -> Result<LinkTable> {
        let Some(entry) = self.directory.by_tag(FourCC::KEY_STAR).next() else {
            debug!("No KEY* resource, link table is empty");
            return Ok(LinkTable::default());
        };

        let payload = self.load_payload(entry).map_err(|e| {
            ArchiveError::Directory(format!("KEY* resource {} unreadable: {e}", entry.id))
        })?;
        Ok(LinkTable::parse(&payload, self.endianness())?)
    }

    /// Byte order of the container
    pub const fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    /// Storage layout of the container
    pub const fn layout(&self) -> StorageLayout {
        self.header.layout
    }

    /// Codec tag from the container header
    pub const fn codec(&self) -> FourCC {
        self.header.codec
    }

    /// Whether the container is a cast rather than a movie
    pub fn is_cast(&self) -> bool {
        self.header.is_cast()
    }

    /// Offset of the movie inside the input (non-zero for projectors)
    pub const fn movie_offset(&self) -> usize {
        self.movie_offset
    }

    /// Size of the movie buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the movie buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Configuration the archive was opened with
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Authoring tool version recorded in `imap`, for classic containers
    pub fn archive_version(&self) -> Option<u32> {
        match &self.backend {
            Backend::Classic(classic) => Some(classic.initial_map.archive_version),
            Backend::Afterburner(_) => None,
        }
    }

    /// Afterburner build string, for Afterburner containers that record one
    pub fn afterburner_version(&self) -> Option<&str> {
        match &self.backend {
            Backend::Afterburner(store) => store.map.build.as_deref(),
            Backend::Classic(_) => None,
        }
    }

    /// Afterburner compression table (empty for classic containers)
    pub fn compressions(&self) -> &[CompressionDescriptor] {
        match &self.backend {
            Backend::Afterburner(store) => &store.map.compressions,
            Backend::Classic(_) => &[],
        }
    }

    /// The resource directory
    pub const fn directory(&self) -> &ResourceDirectory {
        &self.directory
    }

    /// Entry for a resource id
    pub fn get_entry(&self, id: u32) -> Result<&ResourceEntry> {
        self.directory.get(id).ok_or(ArchiveError::NotFound(id))
    }

    /// All entries in directory order
    pub fn entries(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.directory.iter()
    }

    /// Entries carrying `tag`, in directory order
    pub fn entries_by_tag(&self, tag: FourCC) -> impl Iterator<Item = &ResourceEntry> {
        self.directory.by_tag(tag)
    }

    /// Load the payload of a resource by id
    pub fn load(&self, id: u32) -> Result<Bytes> {
        self.load_payload(self.get_entry(id)?)
    }

    /// Load the payload of a directory entry
    ///
    /// Classic payloads are slices of the container buffer. Afterburner
    /// payloads come from the initial load segment, the cache, or are
    /// inflated and cached on first access.
    pub fn load_payload(&self, entry: &ResourceEntry) -> Result<Bytes> {
        match (&self.backend, entry.storage) {
            (Backend::Classic(_), StorageKind::Classic { offset, length }) => {
                self.load_classic(entry, offset, length)
            }
            (Backend::Afterburner(store), StorageKind::AfterburnerSegment { .. }) => {
                self.load_segment(store, entry.id)
            }
            _ => Err(ArchiveError::corrupt(
                entry.id,
                "entry does not belong to this container's storage layout",
            )),
        }
    }

    fn load_classic(&self, entry: &ResourceEntry, offset: u32, length: u32) -> Result<Bytes> {
        let start = offset as usize + CHUNK_HEADER_SIZE;
        let range = start..start + length as usize;
        if range.end > self.data.len() {
            return Err(ArchiveError::corrupt(
                entry.id,
                format!("payload {range:?} exceeds buffer of {} bytes", self.data.len()),
            ));
        }

        if self.config.verify_chunk_headers {
            let (tag, stored_length) =
                read_chunk_header(&self.data, offset as usize, self.endianness())
                    .map_err(|e| ArchiveError::corrupt(entry.id, e))?;
            if tag != entry.tag || stored_length != length {
                return Err(ArchiveError::corrupt(
                    entry.id,
                    format!(
                        "chunk header '{tag}' ({stored_length} bytes) does not match directory '{}' ({length} bytes)",
                        entry.tag
                    ),
                ));
            }
        }

        Ok(self.data.slice(range))
    }

    fn load_segment(&self, store: &AfterburnerStore, id: u32) -> Result<Bytes> {
        if let Some(range) = store.ils_ranges.get(&id) {
            trace!("Resource {id} served from initial load segment");
            return Ok(store.ils.slice(range.clone()));
        }

        if self.config.cache_segments
            && let Some(cached) = store.cache.get(id)
        {
            trace!("Resource {id} served from segment cache");
            return Ok(cached);
        }

        let segment = store.segments.get(&id).ok_or(ArchiveError::NotFound(id))?;
        if segment.is_inline() {
            return Err(ArchiveError::corrupt(
                id,
                "stored inline but missing from the initial load segment",
            ));
        }
        if segment.compressed_length == 0 {
            return match segment.uncompressed_length {
                0 => Ok(Bytes::new()),
                expected => Err(length_mismatch(id, expected, 0)),
            };
        }

        let range = store
            .map
            .stored_range(segment)
            .map_err(|e| ArchiveError::corrupt(id, e))?;
        if range.end > self.data.len() {
            return Err(ArchiveError::corrupt(
                id,
                format!("segment {range:?} exceeds buffer of {} bytes", self.data.len()),
            ));
        }

        match segment.compression {
            CompressionKind::Zlib => {
                let inflated = inflate(
                    &self.data[range],
                    Some(segment.uncompressed_length as usize),
                    self.config.max_inflated_size,
                )
                .map_err(|e| ArchiveError::corrupt(id, e))?;
                debug!(
                    "Inflated resource {id} ('{}'): {} -> {} bytes",
                    segment.tag,
                    segment.compressed_length,
                    inflated.len()
                );

                let payload = Bytes::from(inflated);
                if self.config.cache_segments {
                    Ok(store.cache.insert(id, payload))
                } else {
                    store.cache.record_inflation();
                    Ok(payload)
                }
            }
            CompressionKind::Uncompressed | CompressionKind::Sound => {
                if range.len() != segment.uncompressed_length as usize {
                    return Err(length_mismatch(
                        id,
                        segment.uncompressed_length,
                        range.len(),
                    ));
                }
                Ok(self.data.slice(range))
            }
            kind @ (CompressionKind::FontMap | CompressionKind::Unknown) => Err(
                ArchiveError::corrupt(id, format!("unsupported compression {kind:?}")),
            ),
        }
    }

    /// Parent of a resource according to `KEY*`
    pub fn parent_of(&self, id: u32) -> Option<u32> {
        self.links.parent_of(id).map(|link| link.parent_id)
    }

    /// Full `KEY*` link for a child resource
    pub fn link_of(&self, id: u32) -> Option<&ParentLink> {
        self.links.parent_of(id)
    }

    /// Children of a resource, optionally restricted to one tag
    pub fn children_of(&self, parent_id: u32, tag: Option<FourCC>) -> Vec<&ParentLink> {
        match tag {
            Some(tag) => self.links.children_with_tag(parent_id, tag).collect(),
            None => self.links.children_of(parent_id).collect(),
        }
    }

    /// The `KEY*` link table
    pub const fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Reader over a payload
    ///
    /// Uses the container byte order unless `endianness` overrides it;
    /// cast tables and cast members must be read big-endian.
    pub fn create_reader<'a>(
        &self,
        bytes: &'a [u8],
        endianness: Option<Endianness>,
    ) -> ByteReader<'a> {
        ByteReader::new(bytes, endianness.unwrap_or(self.header.endianness))
    }

    /// Segment cache counters (all zero for classic containers)
    pub fn cache_stats(&self) -> CacheStats {
        match &self.backend {
            Backend::Afterburner(store) => store.cache.stats(),
            Backend::Classic(_) => CacheStats::default(),
        }
    }

    /// Every resource with a non-empty payload, named `{tag}_{id:04}.bin`
    ///
    /// Resources that fail to load are returned as errors in place.
    pub fn export_resources(&self) -> Vec<Result<ExportedResource>> {
        self.entries()
            .filter(|entry| entry.declared_length() > 0)
            .filter_map(|entry| match self.load_payload(entry) {
                Ok(bytes) if bytes.is_empty() => None,
                Ok(bytes) => Some(Ok(ExportedResource {
                    id: entry.id,
                    tag: entry.tag,
                    file_name: entry.export_file_name(),
                    bytes,
                })),
                Err(e) => Some(Err(e)),
            })
            .collect()
    }
}

fn length_mismatch(id: u32, expected: u32, actual: usize) -> ArchiveError {
    ArchiveError::corrupt(
        id,
        AfterburnerError::LengthMismatch {
            expected: expected as usize,
            actual,
        },
    )
}
