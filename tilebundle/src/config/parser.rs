//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module is the single place where INI key names are mapped to
//! struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::{clamp_bundle_ttl, MAX_MANIFEST_TTL_SECS, MIN_MANIFEST_TTL_SECS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = non_empty(section, "endpoint") {
            let v = v.trim_end_matches('/');
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "store",
                    "endpoint",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.store.endpoint = v.to_string();
        }
        if let Some(v) = non_empty(section, "bucket") {
            config.store.bucket = v.to_string();
        }
        if let Some(v) = non_empty(section, "access_key") {
            config.store.access_key = Some(v.to_string());
        }
        if let Some(v) = non_empty(section, "secret_key") {
            config.store.secret_key = Some(v.to_string());
        }
        if let Some(v) = section.get("timeout") {
            config.store.timeout = parse_positive(
                "store",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
        if let Some(v) = non_empty(section, "tile_extension") {
            config.store.tile_extension = v.trim_start_matches('.').to_string();
        }
    }

    // [manifest] section
    if let Some(section) = ini.section(Some("manifest")) {
        if let Some(v) = non_empty(section, "path") {
            config.manifest.path = if v.starts_with('/') {
                v.to_string()
            } else {
                format!("/{}", v)
            };
        }
        if let Some(v) = section.get("ttl") {
            let ttl: u64 = parse_number("manifest", "ttl", v, "must be an integer (seconds)")?;
            if ttl < MIN_MANIFEST_TTL_SECS {
                return Err(invalid(
                    "manifest",
                    "ttl",
                    v,
                    &format!("must be at least {} seconds", MIN_MANIFEST_TTL_SECS),
                ));
            }
            if ttl > MAX_MANIFEST_TTL_SECS {
                return Err(invalid(
                    "manifest",
                    "ttl",
                    v,
                    &format!("must be at most {} seconds", MAX_MANIFEST_TTL_SECS),
                ));
            }
            config.manifest.ttl = ttl;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                invalid(
                    "cache",
                    "memory_size",
                    v,
                    "expected format like '512MB', '2GB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("bundle_ttl") {
            config.cache.bundle_ttl = parse_positive(
                "cache",
                "bundle_ttl",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [preload] section
    if let Some(section) = ini.section(Some("preload")) {
        if let Some(v) = section.get("chunk_size") {
            config.preload.chunk_size =
                parse_positive("preload", "chunk_size", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("concurrency") {
            config.preload.concurrency =
                parse_positive("preload", "concurrency", v, "must be a positive integer")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    config.cache.bundle_ttl = clamp_bundle_ttl(config.cache.bundle_ttl, config.manifest.ttl);

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialEq + Default,
{
    let parsed: T = parse_number(section, key, value, reason)?;
    if parsed == T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
