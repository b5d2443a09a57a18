//! Bundle building: concurrent fetch, partial-failure tolerance, caching.

use super::coalesce::{BuildResult, BundleCoalescer, CoalescerStats, Registration};
use super::frame::{decode_envelope, encode_envelope};
use super::id::{bundle_id_normalized, normalize_indices};
use super::types::{Bundle, BundleError, EncodedBundle, TileEncoding, TileRecord};
use crate::cache::CacheStore;
use crate::manifest::VersionInfo;
use crate::store::ObjectStore;
use crate::tile::TileFetcher;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

/// Default bundle cache lifetime. Shorter than the manifest's.
pub const DEFAULT_BUNDLE_TTL: Duration = Duration::from_secs(300);

const BUNDLE_CACHE_PREFIX: &str = "tilebundle:bundle:";

/// Bundle builder settings.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// How long a built bundle stays cached
    pub ttl: Duration,
    /// Share one build between concurrent requests for the same bundle
    pub coalesce: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_BUNDLE_TTL,
            coalesce: true,
        }
    }
}

/// Cache key of a bundle.
pub fn bundle_cache_key(bundle_id: &str) -> String {
    format!("{}{}", BUNDLE_CACHE_PREFIX, bundle_id)
}

/// Builds tile bundles for a version.
///
/// Every requested tile is fetched concurrently. Tiles that fail are left
/// out and logged; the build only fails when none succeed. Finished
/// bundles are cached by bundle id, so any ordering of the same index set
/// is served from one entry.
pub struct BundleBuilder<S, C> {
    tiles: Arc<TileFetcher<S, C>>,
    cache: Arc<C>,
    coalescer: BundleCoalescer,
    config: BundleConfig,
}

impl<S, C> BundleBuilder<S, C>
where
    S: ObjectStore + 'static,
    C: CacheStore + 'static,
{
    pub fn new(tiles: Arc<TileFetcher<S, C>>, cache: Arc<C>, config: BundleConfig) -> Self {
        Self {
            tiles,
            cache,
            coalescer: BundleCoalescer::new(),
            config,
        }
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Builds (or loads from cache) the bundle and renders it in `encoding`.
    pub async fn build_bundle(
        &self,
        version: &str,
        indices: &[u32],
        encoding: TileEncoding,
    ) -> Result<EncodedBundle, BundleError> {
        let bundle = self.build(version, indices).await?;
        bundle.encode(encoding)
    }

    /// Builds (or loads from cache) the bundle for `indices`.
    #[instrument(skip_all, fields(version = %version, requested = indices.len()))]
    pub async fn build(
        &self,
        version: &str,
        indices: &[u32],
    ) -> Result<Arc<Bundle>, BundleError> {
        let indices = normalize_indices(indices);
        if indices.is_empty() {
            return Err(BundleError::Empty {
                version: version.to_string(),
            });
        }
        let bundle_id = bundle_id_normalized(version, &indices);

        if let Some(bundle) = self.cached(version, &bundle_id).await {
            return Ok(bundle);
        }

        if !self.config.coalesce {
            return self.build_uncached(version, &indices, &bundle_id).await;
        }

        loop {
            match self.coalescer.register(&bundle_id) {
                Registration::Leader(leader) => {
                    // Another leader may have finished between our lookup and registration
                    let result = match self.cached(version, &bundle_id).await {
                        Some(bundle) => Ok(bundle),
                        None => self.build_uncached(version, &indices, &bundle_id).await,
                    };
                    leader.complete(result.clone());
                    return result;
                }
                Registration::Waiter(mut rx) => match rx.recv().await {
                    Ok(result) => return result,
                    Err(_) => {
                        debug!(bundle_id = %bundle_id, "In-flight build abandoned, retrying");
                    }
                },
            }
        }
    }

    /// Removes a cached bundle. Returns `false` if the cache rejected the delete.
    pub async fn invalidate_bundle(&self, bundle_id: &str) -> bool {
        match self.cache.delete(&bundle_cache_key(bundle_id)).await {
            Ok(()) => {
                debug!(bundle_id, "Bundle invalidated");
                true
            }
            Err(e) => {
                warn!(bundle_id, error = %e, "Failed to invalidate bundle");
                false
            }
        }
    }

    async fn cached(&self, version: &str, bundle_id: &str) -> Option<Arc<Bundle>> {
        let key = bundle_cache_key(bundle_id);
        let envelope = self.cache.get(&key).await?;

        match decode_envelope(&envelope, version, bundle_id) {
            Ok(bundle) => {
                debug!(bundle_id, tiles = bundle.tile_count(), "Bundle cache hit");
                Some(Arc::new(bundle))
            }
            Err(e) => {
                warn!(bundle_id, error = %e, "Discarding unreadable cached bundle");
                if let Err(e) = self.cache.delete(&key).await {
                    warn!(bundle_id, error = %e, "Failed to evict cached bundle");
                }
                None
            }
        }
    }

    async fn build_uncached(&self, version: &str, indices: &[u32], bundle_id: &str) -> BuildResult {
        // Bounds are checked for the whole set before any tile request
        let info = self.tiles.validate_indices(version, indices).await?;
        let tiles = self.fetch_all(version, &info, indices).await;

        if tiles.is_empty() {
            warn!(version, requested = indices.len(), "No tiles could be fetched");
            return Err(BundleError::Empty {
                version: version.to_string(),
            });
        }

        let bundle = Arc::new(Bundle::new(version, bundle_id, tiles, Utc::now()));
        debug!(
            bundle_id,
            tiles = bundle.tile_count(),
            requested = indices.len(),
            total_size = bundle.total_size(),
            "Bundle built"
        );

        self.store(&bundle).await;
        Ok(bundle)
    }

    async fn fetch_all(&self, version: &str, info: &VersionInfo, indices: &[u32]) -> Vec<TileRecord> {
        let mut fetches = JoinSet::new();

        for &index in indices {
            let tiles = Arc::clone(&self.tiles);
            let info = info.clone();
            fetches.spawn(async move { (index, tiles.fetch_validated(&info, index).await) });
        }

        let mut records = Vec::with_capacity(indices.len());
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((index, Ok(payload))) => records.push(TileRecord::new(index, payload)),
                Ok((index, Err(e))) => {
                    warn!(version, index, error = %e, "Tile fetch failed, dropping from bundle");
                }
                Err(join_err) => {
                    warn!(version, error = %join_err, "Tile fetch task panicked");
                }
            }
        }
        records
    }

    async fn store(&self, bundle: &Bundle) {
        let envelope = match encode_envelope(bundle) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(bundle_id = bundle.bundle_id(), error = %e, "Bundle not cacheable");
                return;
            }
        };

        let key = bundle_cache_key(bundle.bundle_id());
        if let Err(e) = self.cache.set(&key, envelope, self.config.ttl).await {
            warn!(bundle_id = bundle.bundle_id(), error = %e, "Failed to cache bundle");
        }
    }
}
