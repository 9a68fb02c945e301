//! Configuration for opening containers

use dirfile_formats::afterburner::MAX_INFLATED_SIZE;
use serde::{Deserialize, Serialize};

/// Configuration for opening containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Largest buffer a single inflation may produce (in bytes)
    pub max_inflated_size: usize,

    /// Search projector executables for the embedded movie
    pub locate_embedded_movie: bool,

    /// Check the chunk header in front of each classic payload on load
    pub verify_chunk_headers: bool,

    /// Keep inflated Afterburner segments for later loads
    pub cache_segments: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_inflated_size: MAX_INFLATED_SIZE,
            locate_embedded_movie: true,
            verify_chunk_headers: true,
            cache_segments: true,
        }
    }
}

impl ArchiveConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inflation size limit
    #[must_use]
    pub const fn with_max_inflated_size(mut self, size: usize) -> Self {
        self.max_inflated_size = size;
        self
    }

    /// Enable or disable the projector search
    #[must_use]
    pub const fn with_embedded_movie_search(mut self, enable: bool) -> Self {
        self.locate_embedded_movie = enable;
        self
    }

    /// Enable or disable classic chunk header checks
    #[must_use]
    pub const fn with_chunk_header_verification(mut self, enable: bool) -> Self {
        self.verify_chunk_headers = enable;
        self
    }

    /// Enable or disable the segment cache
    #[must_use]
    pub const fn with_segment_cache(mut self, enable: bool) -> Self {
        self.cache_segments = enable;
        self
    }
}
