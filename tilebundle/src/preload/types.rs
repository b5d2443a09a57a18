//! Preload types.

use crate::manifest::{ManifestError, VersionId};
use thiserror::Error;

/// Default number of tiles per chunk.
pub const DEFAULT_CHUNK_SIZE: u32 = 64;

/// Default number of chunks built concurrently.
pub const DEFAULT_PRELOAD_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreloadError {
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("preload concurrency must be at least 1")]
    InvalidConcurrency,

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Preloader settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadConfig {
    pub chunk_size: u32,
    /// Chunks in flight at once
    pub concurrency: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_PRELOAD_CONCURRENCY,
        }
    }
}

/// Outcome of a preload run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadReport {
    pub version: VersionId,
    pub total_chunks: usize,
    /// Chunks whose bundle was built or already cached
    pub completed: usize,
    pub failed: usize,
    /// Tiles held by the completed bundles
    pub tiles_loaded: usize,
    /// The run stopped early because it was cancelled
    pub cancelled: bool,
}

impl PreloadReport {
    pub(crate) fn new(version: &str, total_chunks: usize) -> Self {
        Self {
            version: version.to_string(),
            total_chunks,
            completed: 0,
            failed: 0,
            tiles_loaded: 0,
            cancelled: false,
        }
    }

    /// Chunks not attempted because of cancellation.
    pub fn skipped(&self) -> usize {
        self.total_chunks
            .saturating_sub(self.completed + self.failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}
