//! Error types for tile fetching.

use crate::manifest::ManifestError;
use crate::store::StoreError;
use std::ops::Range;
use thiserror::Error;

/// Errors that can occur while fetching a tile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileError {
    /// The index is not in `0..tile_count` for the version
    #[error(
        "tile index {index} is out of range for version '{version}' (valid range {}..{})",
        .valid_range.start,
        .valid_range.end
    )]
    OutOfRange {
        version: String,
        index: u32,
        valid_range: Range<u32>,
    },

    /// The object store answered with a non-success status
    #[error("tile '{key}' not found (HTTP {status})")]
    NotFound { key: String, status: u16 },

    /// The manifest could not be loaded or does not list the version
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Transport or configuration failure talking to the store
    #[error("tile fetch failed: {0}")]
    Store(StoreError),
}

impl TileError {
    /// True for errors caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TileError::OutOfRange { .. } | TileError::Manifest(ManifestError::UnknownVersion(_))
        )
    }
}
