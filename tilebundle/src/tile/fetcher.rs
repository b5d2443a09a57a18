//! Single-tile fetching.

use super::error::TileError;
use super::request::{tile_key, DEFAULT_TILE_EXTENSION};
use crate::cache::CacheStore;
use crate::manifest::{ManifestLoader, VersionInfo};
use crate::store::{ObjectStore, StoreError};
use bytes::Bytes;
use std::sync::Arc;
use tracing::trace;

/// Fetches raw tile bytes, validating indices against the manifest.
///
/// Tiles are not cached here; only whole bundles are.
pub struct TileFetcher<S, C> {
    store: Arc<S>,
    manifest: Arc<ManifestLoader<S, C>>,
    extension: String,
}

impl<S: ObjectStore, C: CacheStore> TileFetcher<S, C> {
    pub fn new(store: Arc<S>, manifest: Arc<ManifestLoader<S, C>>) -> Self {
        Self {
            store,
            manifest,
            extension: DEFAULT_TILE_EXTENSION.to_string(),
        }
    }

    /// Sets the tile object extension (default `png`).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn manifest(&self) -> &Arc<ManifestLoader<S, C>> {
        &self.manifest
    }

    /// Checks every index against the version's tile count.
    ///
    /// Fails on the first out-of-range index without touching the store.
    pub async fn validate_indices(
        &self,
        version: &str,
        indices: &[u32],
    ) -> Result<VersionInfo, TileError> {
        let info = self.manifest.get_version_info(version).await?;
        if let Some(&index) = indices.iter().find(|&&i| i >= info.tile_count) {
            return Err(TileError::OutOfRange {
                version: version.to_string(),
                index,
                valid_range: 0..info.tile_count,
            });
        }
        Ok(info)
    }

    /// Returns the raw bytes of one tile.
    pub async fn get_tile_bytes(&self, version: &str, index: u32) -> Result<Bytes, TileError> {
        let info = self.validate_indices(version, &[index]).await?;
        self.fetch_validated(&info, index).await
    }

    /// Fetches a tile whose index has already been validated against `info`.
    pub(crate) async fn fetch_validated(
        &self,
        info: &VersionInfo,
        index: u32,
    ) -> Result<Bytes, TileError> {
        let key = tile_key(&info.storage_path, index, &self.extension);
        trace!(key = %key, "Fetching tile");

        match self.store.signed_get(&key, &[]).await {
            Ok(response) => Ok(response.body),
            Err(StoreError::Remote { status, .. }) => Err(TileError::NotFound { key, status }),
            Err(e) => Err(TileError::Store(e)),
        }
    }
}
