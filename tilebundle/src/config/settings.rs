//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub store: StoreSettings,
    pub manifest: ManifestSettings,
    pub cache: CacheSettings,
    pub preload: PreloadSettings,
    pub logging: LoggingSettings,
}

/// Object store connection.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Base URL, e.g. `https://objects.example.com`
    pub endpoint: String,
    pub bucket: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Tile object extension without the dot
    pub tile_extension: String,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("tile_extension", &self.tile_extension)
            .finish()
    }
}

/// Manifest location and caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    /// Object path of the manifest document
    pub path: String,
    /// Cache lifetime in seconds
    pub ttl: u64,
}

/// In-process cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Memory cache size in bytes
    pub memory_size: usize,
    /// Bundle cache lifetime in seconds; kept below the manifest TTL
    pub bundle_ttl: u64,
}

/// Cache warming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadSettings {
    /// Tiles per chunk
    pub chunk_size: u32,
    /// Chunks built at once
    pub concurrency: usize,
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
