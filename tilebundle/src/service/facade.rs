//! Service facade wiring every component from one config.

use super::config::ServiceConfig;
use super::error::ServiceError;
use crate::bundle::{BundleBuilder, CoalescerStats, EncodedBundle, TileEncoding};
use crate::cache::{CacheStore, MemoryCache};
use crate::config::ConfigFile;
use crate::grid::{self, GridCoordinate, GridRegion};
use crate::manifest::{Manifest, ManifestLoader, VersionInfo};
use crate::preload::{plan_chunks, ChunkPlan, PreloadReport, Preloader};
use crate::store::{list_objects, ObjectEntry, ObjectStore, ReqwestObjectStore};
use crate::tile::{normalize_storage_path, TileFetcher};
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Entry point for manifest lookups, tile and bundle fetches, and preloading.
///
/// All components share one object store and one cache.
pub struct TileAssetService<S = ReqwestObjectStore, C = MemoryCache> {
    store: Arc<S>,
    cache: Arc<C>,
    manifest: Arc<ManifestLoader<S, C>>,
    tiles: Arc<TileFetcher<S, C>>,
    builder: Arc<BundleBuilder<S, C>>,
    preloader: Preloader<S, C>,
}

impl TileAssetService<ReqwestObjectStore, MemoryCache> {
    /// Builds the service with the HTTP object store and an in-memory cache.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ServiceError> {
        let store = Arc::new(ReqwestObjectStore::new(config.store.clone())?);
        let cache = Arc::new(MemoryCache::new(config.memory_cache_size));
        info!(
            endpoint = %config.store.endpoint,
            bucket = %config.store.bucket,
            cache_bytes = config.memory_cache_size,
            "Tile asset service configured"
        );
        Self::new(store, cache, &config)
    }

    /// Builds the service from a loaded config file.
    pub fn from_config_file(file: &ConfigFile) -> Result<Self, ServiceError> {
        Self::from_config(ServiceConfig::from_config_file(file)?)
    }
}

impl<S, C> TileAssetService<S, C>
where
    S: ObjectStore + 'static,
    C: CacheStore + 'static,
{
    /// Wires the components around caller-supplied store and cache.
    pub fn new(store: Arc<S>, cache: Arc<C>, config: &ServiceConfig) -> Result<Self, ServiceError> {
        let manifest = Arc::new(ManifestLoader::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            config.manifest.clone(),
        ));
        let tiles = Arc::new(
            TileFetcher::new(Arc::clone(&store), Arc::clone(&manifest))
                .with_extension(config.tile_extension.clone()),
        );
        let builder = Arc::new(BundleBuilder::new(
            Arc::clone(&tiles),
            Arc::clone(&cache),
            config.bundle.clone(),
        ));
        let preloader = Preloader::new(Arc::clone(&builder), Arc::clone(&manifest), config.preload)?;

        Ok(Self {
            store,
            cache,
            manifest,
            tiles,
            builder,
            preloader,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub async fn get_manifest(&self) -> Result<Arc<Manifest>, ServiceError> {
        Ok(self.manifest.get_manifest().await?)
    }

    pub async fn refresh_manifest(&self) -> Result<Arc<Manifest>, ServiceError> {
        Ok(self.manifest.refresh_manifest().await?)
    }

    pub async fn get_version_info(&self, version: &str) -> Result<VersionInfo, ServiceError> {
        Ok(self.manifest.get_version_info(version).await?)
    }

    pub async fn get_latest_version(&self) -> Result<String, ServiceError> {
        Ok(self.manifest.get_latest_version().await?)
    }

    pub async fn get_tile_bytes(&self, version: &str, index: u32) -> Result<Bytes, ServiceError> {
        Ok(self.tiles.get_tile_bytes(version, index).await?)
    }

    pub async fn build_bundle(
        &self,
        version: &str,
        indices: &[u32],
        encoding: TileEncoding,
    ) -> Result<EncodedBundle, ServiceError> {
        Ok(self.builder.build_bundle(version, indices, encoding).await?)
    }

    /// Builds the bundle covering a grid rectangle.
    pub async fn build_region_bundle(
        &self,
        version: &str,
        region: GridRegion,
        encoding: TileEncoding,
    ) -> Result<EncodedBundle, ServiceError> {
        let indices: Vec<u32> = self
            .tiles_in_region(version, region)
            .await?
            .into_iter()
            .map(|c| c.index)
            .collect();
        self.build_bundle(version, &indices, encoding).await
    }

    pub async fn invalidate_bundle(&self, bundle_id: &str) -> bool {
        self.builder.invalidate_bundle(bundle_id).await
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.builder.coalescer_stats()
    }

    /// Grid position of `index` within `version`.
    pub async fn coordinate(&self, version: &str, index: u32) -> Result<GridCoordinate, ServiceError> {
        let info = self.get_version_info(version).await?;
        Ok(grid::coordinate(version, index, info.tile_count)?)
    }

    /// Linear index of `(x, y)` within `version`.
    pub async fn index_at(&self, version: &str, x: u32, y: u32) -> Result<u32, ServiceError> {
        let info = self.get_version_info(version).await?;
        let size = grid::grid_size(info.tile_count)?;
        Ok(grid::to_index(x, y, size)?)
    }

    pub async fn tiles_in_region(
        &self,
        version: &str,
        region: GridRegion,
    ) -> Result<Vec<GridCoordinate>, ServiceError> {
        let info = self.get_version_info(version).await?;
        Ok(grid::tiles_in_region(version, info.tile_count, region)?)
    }

    /// Chunk layout `preload` would use for `version`.
    pub async fn plan_chunks(
        &self,
        version: &str,
        chunk_size: u32,
    ) -> Result<Vec<ChunkPlan>, ServiceError> {
        let info = self.get_version_info(version).await?;
        Ok(plan_chunks(version, info.tile_count, chunk_size)?)
    }

    pub async fn preload(&self, version: &str, chunk_size: u32) -> Result<PreloadReport, ServiceError> {
        Ok(self.preloader.preload(version, chunk_size).await?)
    }

    /// Preloads with the configured chunk size.
    pub async fn preload_version(&self, version: &str) -> Result<PreloadReport, ServiceError> {
        Ok(self.preloader.preload_version(version).await?)
    }

    pub async fn preload_with_cancellation(
        &self,
        version: &str,
        chunk_size: u32,
        cancellation: CancellationToken,
    ) -> Result<PreloadReport, ServiceError> {
        Ok(self
            .preloader
            .preload_with_cancellation(version, chunk_size, cancellation)
            .await?)
    }

    /// Lists the objects stored under a version's storage path.
    pub async fn list_version_objects(&self, version: &str) -> Result<Vec<ObjectEntry>, ServiceError> {
        let info = self.get_version_info(version).await?;
        let prefix = format!("{}/", normalize_storage_path(&info.storage_path));
        Ok(list_objects(self.store.as_ref(), &prefix).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleConfig, EncodedPayload};
    use crate::manifest::{ManifestConfig, DEFAULT_MANIFEST_PATH};
    use crate::preload::PreloadConfig;
    use crate::store::testing::MockObjectStore;
    use crate::store::StoreConfig;

    const DOC: &str = "latest: v2\nmapversions:\n  v1:\n    name: Old\n    path: ./tiles/v1/\n    tilecount: 10\n  v2:\n    name: Current\n    path: ./tiles/v2/\n    tilecount: 16\n";

    fn config() -> ServiceConfig {
        ServiceConfig {
            store: StoreConfig::new("https://objects.example.com", "maps"),
            manifest: ManifestConfig::default(),
            bundle: BundleConfig::default(),
            preload: PreloadConfig::default(),
            tile_extension: "png".to_string(),
            memory_cache_size: 1 << 20,
        }
    }

    fn service() -> TileAssetService<MockObjectStore, MemoryCache> {
        let store = Arc::new(MockObjectStore::new());
        store.insert(DEFAULT_MANIFEST_PATH, DOC);
        for i in 0..16u32 {
            store.insert(&format!("/tiles/v2/{}.png", i), vec![i as u8]);
        }
        let cache = Arc::new(MemoryCache::new(1 << 20));
        TileAssetService::new(store, cache, &config()).unwrap()
    }

    #[tokio::test]
    async fn test_manifest_views() {
        let service = service();
        assert_eq!(service.get_latest_version().await.unwrap(), "v2");
        assert_eq!(service.get_version_info("v1").await.unwrap().tile_count, 10);
        assert_eq!(service.get_manifest().await.unwrap().version_count(), 2);
    }

    #[tokio::test]
    async fn test_region_bundle() {
        let service = service();
        let encoded = service
            .build_region_bundle("v2", GridRegion::new(0, 0, 1, 1), TileEncoding::Hex)
            .await
            .unwrap();

        assert_eq!(encoded.tile_count, 4);
        match encoded.payload {
            EncodedPayload::Text(tiles) => {
                let indices: Vec<u32> = tiles.iter().map(|t| t.index).collect();
                assert_eq!(indices, vec![0, 1, 4, 5]);
                assert_eq!(tiles[2].data, "04");
            }
            EncodedPayload::Binary(_) => panic!("expected text payload"),
        }
    }

    #[tokio::test]
    async fn test_grid_queries_need_square_versions() {
        let service = service();
        assert_eq!(service.index_at("v2", 3, 2).await.unwrap(), 11);
        assert_eq!(service.coordinate("v2", 11).await.unwrap().x, 3);

        let err = service.coordinate("v1", 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Grid(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_plan_and_preload() {
        let service = service();
        let plans = service.plan_chunks("v2", 5).await.unwrap();
        assert_eq!(plans.len(), 4);

        let report = service.preload("v2", 5).await.unwrap();
        assert_eq!(report.completed, 4);
        assert_eq!(report.tiles_loaded, 16);
    }

    #[tokio::test]
    async fn test_tile_out_of_range_is_client_error() {
        let service = service();
        let err = service.get_tile_bytes("v2", 16).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_from_config_rejects_missing_endpoint() {
        let mut config = config();
        config.store = StoreConfig::new("", "maps");
        assert!(matches!(
            TileAssetService::from_config(config),
            Err(ServiceError::Store(_))
        ));
    }
}
