//! Service wiring settings.

use crate::bundle::BundleConfig;
use crate::config::ConfigFile;
use crate::manifest::ManifestConfig;
use crate::preload::PreloadConfig;
use crate::store::{Credentials, StoreConfig, StoreError};
use std::time::Duration;

/// Everything needed to assemble a [`TileAssetService`](super::TileAssetService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub store: StoreConfig,
    pub manifest: ManifestConfig,
    pub bundle: BundleConfig,
    pub preload: PreloadConfig,
    pub tile_extension: String,
    /// Memory cache capacity in bytes
    pub memory_cache_size: usize,
}

impl ServiceConfig {
    /// Builds service settings from a loaded config file.
    ///
    /// Credentials are optional here; when both keys are absent requests
    /// fail with a configuration error at the first call. Setting only one
    /// of them is rejected immediately.
    pub fn from_config_file(file: &ConfigFile) -> Result<Self, StoreError> {
        let mut store = StoreConfig::new(file.store.endpoint.clone(), file.store.bucket.clone())
            .with_timeout(Duration::from_secs(file.store.timeout));

        let access = file.store.access_key.as_deref();
        let secret = file.store.secret_key.as_deref();
        if access.is_some() || secret.is_some() {
            store = store.with_credentials(Credentials::from_optional(access, secret)?);
        }

        Ok(Self {
            store,
            manifest: ManifestConfig {
                path: file.manifest.path.clone(),
                ttl: Duration::from_secs(file.manifest.ttl),
            },
            bundle: BundleConfig {
                ttl: Duration::from_secs(file.cache.bundle_ttl),
                ..BundleConfig::default()
            },
            preload: PreloadConfig {
                chunk_size: file.preload.chunk_size,
                concurrency: file.preload.concurrency,
            },
            tile_extension: file.store.tile_extension.clone(),
            memory_cache_size: file.cache.memory_size,
        })
    }
}
