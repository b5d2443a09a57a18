//! Manifest data types.

use crate::store::StoreError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Identifier of a map version, e.g. `v3`.
pub type VersionId = String;

/// Errors from loading or querying the manifest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// The manifest document is malformed or semantically empty
    #[error("manifest parse error: {0}")]
    Parse(String),

    /// The requested version is not listed
    #[error("unknown map version '{0}'")]
    UnknownVersion(String),

    /// Fetching the manifest failed
    #[error("failed to fetch manifest: {0}")]
    Store(#[from] StoreError),
}

/// One entry of the `mapversions:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Human-readable name
    pub display_name: String,
    /// Storage prefix of the version's tiles, as written in the manifest
    pub storage_path: String,
    /// Number of tiles; a perfect square for grid-addressable versions
    pub tile_count: u32,
}

/// Every published map version and which one is current.
///
/// Immutable once parsed. A refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    latest_version: VersionId,
    versions: BTreeMap<VersionId, VersionInfo>,
}

impl Manifest {
    /// Builds a manifest, enforcing that it is non-empty, that no version
    /// id contains `:` and that `latest_version` is one of `versions`.
    pub fn new(
        latest_version: impl Into<VersionId>,
        versions: BTreeMap<VersionId, VersionInfo>,
    ) -> Result<Self, ManifestError> {
        let latest_version = latest_version.into();

        if latest_version.trim().is_empty() {
            return Err(ManifestError::Parse(
                "'latest' is missing or empty".to_string(),
            ));
        }
        if versions.is_empty() {
            return Err(ManifestError::Parse(
                "'mapversions' lists no versions".to_string(),
            ));
        }
        if let Some(id) = versions.keys().find(|id| id.contains(':')) {
            return Err(ManifestError::Parse(format!(
                "version id '{}' contains ':'",
                id
            )));
        }
        if !versions.contains_key(&latest_version) {
            return Err(ManifestError::Parse(format!(
                "latest version '{}' is not listed in 'mapversions'",
                latest_version
            )));
        }

        Ok(Self {
            latest_version,
            versions,
        })
    }

    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    pub fn version(&self, version: &str) -> Option<&VersionInfo> {
        self.versions.get(version)
    }

    /// Looks up a version, failing with [`ManifestError::UnknownVersion`].
    pub fn require_version(&self, version: &str) -> Result<&VersionInfo, ManifestError> {
        self.version(version)
            .ok_or_else(|| ManifestError::UnknownVersion(version.to_string()))
    }

    /// Versions in key order.
    pub fn versions(&self) -> impl Iterator<Item = (&str, &VersionInfo)> {
        self.versions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}
