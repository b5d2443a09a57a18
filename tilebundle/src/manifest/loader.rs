//! Cache-first manifest loading.

use super::parser::parse_manifest;
use super::types::{Manifest, ManifestError, VersionInfo};
use super::writer::write_manifest;
use crate::cache::CacheStore;
use crate::store::ObjectStore;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Well-known object path of the manifest document.
pub const DEFAULT_MANIFEST_PATH: &str = "/mapversions.yml";

/// Default manifest cache lifetime.
pub const DEFAULT_MANIFEST_TTL: Duration = Duration::from_secs(600);

/// Cache key for the manifest document.
pub const MANIFEST_CACHE_KEY: &str = "tilebundle:manifest";

/// Manifest loader settings.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Object path of the manifest
    pub path: String,
    /// How long a fetched manifest stays cached
    pub ttl: Duration,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MANIFEST_PATH.to_string(),
            ttl: DEFAULT_MANIFEST_TTL,
        }
    }
}

/// Last document seen, with its parsed form.
struct Snapshot {
    document: Bytes,
    manifest: Arc<Manifest>,
}

/// Loads the manifest through the cache and keeps the parsed copy.
///
/// The cache holds the document text; the parsed manifest is reused as long
/// as the cached text is unchanged. Readers always get a complete
/// `Arc<Manifest>`.
pub struct ManifestLoader<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    config: ManifestConfig,
    snapshot: RwLock<Option<Snapshot>>,
}

impl<S: ObjectStore, C: CacheStore> ManifestLoader<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>, config: ManifestConfig) -> Self {
        Self {
            store,
            cache,
            config,
            snapshot: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Returns the manifest, fetching it on a cache miss.
    pub async fn get_manifest(&self) -> Result<Arc<Manifest>, ManifestError> {
        if let Some(document) = self.cache.get(MANIFEST_CACHE_KEY).await {
            match self.parse_cached(&document) {
                Ok(manifest) => return Ok(manifest),
                Err(e) => {
                    warn!(error = %e, "Cached manifest is invalid, refetching");
                    self.evict().await;
                }
            }
        }

        self.fetch().await
    }

    /// Drops the cached manifest and fetches a fresh one.
    pub async fn refresh_manifest(&self) -> Result<Arc<Manifest>, ManifestError> {
        info!(path = %self.config.path, "Refreshing manifest");
        self.evict().await;
        self.fetch().await
    }

    pub async fn get_version_info(&self, version: &str) -> Result<VersionInfo, ManifestError> {
        let manifest = self.get_manifest().await?;
        manifest.require_version(version).cloned()
    }

    pub async fn get_latest_version(&self) -> Result<String, ManifestError> {
        let manifest = self.get_manifest().await?;
        Ok(manifest.latest_version().to_string())
    }

    fn parse_cached(&self, document: &Bytes) -> Result<Arc<Manifest>, ManifestError> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            if snapshot.document == *document {
                return Ok(Arc::clone(&snapshot.manifest));
            }
        }

        let text = std::str::from_utf8(document)
            .map_err(|e| ManifestError::Parse(format!("manifest is not UTF-8: {}", e)))?;
        let manifest = Arc::new(parse_manifest(text)?);
        self.remember(document.clone(), Arc::clone(&manifest));
        Ok(manifest)
    }

    async fn fetch(&self) -> Result<Arc<Manifest>, ManifestError> {
        let response = self.store.signed_get(&self.config.path, &[]).await?;
        let text = std::str::from_utf8(&response.body)
            .map_err(|e| ManifestError::Parse(format!("manifest is not UTF-8: {}", e)))?;
        let manifest = Arc::new(parse_manifest(text)?);

        // Cache the normalized document so every backend stores the same text.
        let document = Bytes::from(write_manifest(&manifest));
        if let Err(e) = self
            .cache
            .set(MANIFEST_CACHE_KEY, document.clone(), self.config.ttl)
            .await
        {
            warn!(error = %e, "Failed to cache manifest");
        }
        self.remember(document, Arc::clone(&manifest));

        debug!(
            latest = manifest.latest_version(),
            versions = manifest.version_count(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    fn remember(&self, document: Bytes, manifest: Arc<Manifest>) {
        *self.snapshot.write() = Some(Snapshot { document, manifest });
    }

    async fn evict(&self) {
        if let Err(e) = self.cache.delete(MANIFEST_CACHE_KEY).await {
            warn!(error = %e, "Failed to evict cached manifest");
        }
        *self.snapshot.write() = None;
    }
}
