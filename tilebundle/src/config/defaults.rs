//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::bundle::DEFAULT_BUNDLE_TTL;
use crate::logging::{DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};
use crate::manifest::{DEFAULT_MANIFEST_PATH, DEFAULT_MANIFEST_TTL};
use crate::preload::{DEFAULT_CHUNK_SIZE, DEFAULT_PRELOAD_CONCURRENCY};
use crate::store::DEFAULT_STORE_TIMEOUT;
use crate::tile::DEFAULT_TILE_EXTENSION;

/// Default memory cache size (512MB).
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 512 * 1024 * 1024;

/// Smallest manifest TTL that still leaves room for a shorter bundle TTL.
pub const MIN_MANIFEST_TTL_SECS: u64 = 2;

/// Largest accepted manifest TTL (30 days). Bundle TTLs stay below it.
pub const MAX_MANIFEST_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Environment variable overriding `[store] access_key`.
pub const ENV_ACCESS_KEY: &str = "TILEBUNDLE_ACCESS_KEY";

/// Environment variable overriding `[store] secret_key`.
pub const ENV_SECRET_KEY: &str = "TILEBUNDLE_SECRET_KEY";

/// Keeps the bundle TTL strictly below the manifest TTL, warning if clamped.
pub(super) fn clamp_bundle_ttl(bundle_ttl: u64, manifest_ttl: u64) -> u64 {
    if bundle_ttl < manifest_ttl {
        return bundle_ttl;
    }
    let clamped = manifest_ttl.saturating_sub(1).max(1);
    tracing::warn!(
        requested = bundle_ttl,
        manifest_ttl,
        clamped,
        "bundle_ttl must be shorter than the manifest ttl, clamping to {}",
        clamped
    );
    clamped
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                endpoint: String::new(),
                bucket: String::new(),
                access_key: None,
                secret_key: None,
                timeout: DEFAULT_STORE_TIMEOUT.as_secs(),
                tile_extension: DEFAULT_TILE_EXTENSION.to_string(),
            },
            manifest: ManifestSettings {
                path: DEFAULT_MANIFEST_PATH.to_string(),
                ttl: DEFAULT_MANIFEST_TTL.as_secs(),
            },
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
                bundle_ttl: DEFAULT_BUNDLE_TTL.as_secs(),
            },
            preload: PreloadSettings {
                chunk_size: DEFAULT_CHUNK_SIZE,
                concurrency: DEFAULT_PRELOAD_CONCURRENCY,
            },
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIR),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
