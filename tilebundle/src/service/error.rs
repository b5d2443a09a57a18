//! Service error types.

use crate::bundle::BundleError;
use crate::config::ConfigFileError;
use crate::grid::GridError;
use crate::manifest::ManifestError;
use crate::preload::PreloadError;
use crate::store::StoreError;
use crate::tile::TileError;
use thiserror::Error;

/// Errors surfaced by [`TileAssetService`](super::TileAssetService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Preload(#[from] PreloadError),
}

impl ServiceError {
    /// True when the caller's request was invalid rather than the backend failing.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Grid(_) | Self::Manifest(ManifestError::UnknownVersion(_)) => true,
            Self::Tile(e) => e.is_client_error(),
            Self::Bundle(BundleError::Tile(e)) => e.is_client_error(),
            Self::Preload(PreloadError::InvalidChunkSize | PreloadError::InvalidConcurrency) => {
                true
            }
            _ => false,
        }
    }
}
