//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub fn to_config_string(config: &ConfigFile) -> String {
    let access_key = config.store.access_key.as_deref().unwrap_or("");
    let secret_key = config.store.secret_key.as_deref().unwrap_or("");

    format!(
        r#"[store]
; Object store base URL, e.g. https://objects.example.com
endpoint = {}
; Bucket holding the manifest and tiles
bucket = {}
; Credentials for request signing. TILEBUNDLE_ACCESS_KEY and
; TILEBUNDLE_SECRET_KEY override these when set.
access_key = {}
secret_key = {}
; Request timeout in seconds (default: 30)
timeout = {}
; Tile object extension (default: png)
tile_extension = {}

[manifest]
; Object path of the version manifest (default: /mapversions.yml)
path = {}
; Seconds a fetched manifest stays cached (default: 600)
ttl = {}

[cache]
; In-process cache size (default: 512MB)
; Supports: KB, MB, GB suffixes (e.g., 256MB, 2GB)
memory_size = {}
; Seconds a built bundle stays cached (default: 300)
; Must be shorter than the manifest ttl; larger values are clamped
bundle_ttl = {}

[preload]
; Tiles per preloaded bundle (default: 64)
chunk_size = {}
; Bundles built at once during preload (default: 3)
concurrency = {}

[logging]
; Log directory (default: logs)
directory = {}
; Log file name, truncated on start (default: tilebundle.log)
file = {}
"#,
        config.store.endpoint,
        config.store.bucket,
        access_key,
        secret_key,
        config.store.timeout,
        config.store.tile_extension,
        config.manifest.path,
        config.manifest.ttl,
        format_size(config.cache.memory_size),
        config.cache.bundle_ttl,
        config.preload.chunk_size,
        config.preload.concurrency,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Writes paths under the home directory with a `~/` prefix.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
