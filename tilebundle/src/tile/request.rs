//! Tile addressing and object key layout.

use crate::manifest::VersionId;
use std::fmt;

/// Default file extension of tile objects.
pub const DEFAULT_TILE_EXTENSION: &str = "png";

/// A tile identified by version and linear index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub version: VersionId,
    pub index: u32,
}

impl TileAddress {
    pub fn new(version: impl Into<VersionId>, index: u32) -> Self {
        Self {
            version: version.into(),
            index,
        }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.version, self.index)
    }
}

/// Strips a leading `./` and any leading or trailing `/`.
///
/// ```
/// use tilebundle::tile::normalize_storage_path;
///
/// assert_eq!(normalize_storage_path("./tiles/v1/"), "tiles/v1");
/// assert_eq!(normalize_storage_path("/tiles/v1"), "tiles/v1");
/// ```
pub fn normalize_storage_path(path: &str) -> &str {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_matches('/')
}

/// Object key of one tile: `/{storage path}/{index}.{extension}`.
pub fn tile_key(storage_path: &str, index: u32, extension: &str) -> String {
    let prefix = normalize_storage_path(storage_path);
    let extension = extension.trim_start_matches('.');
    if prefix.is_empty() {
        format!("/{}.{}", index, extension)
    } else {
        format!("/{}/{}.{}", prefix, index, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_storage_path() {
        assert_eq!(normalize_storage_path("./tiles/v1/"), "tiles/v1");
        assert_eq!(normalize_storage_path("tiles/v1"), "tiles/v1");
        assert_eq!(normalize_storage_path("//tiles/v1//"), "tiles/v1");
        assert_eq!(normalize_storage_path("./"), "");
    }

    #[test]
    fn test_tile_key() {
        assert_eq!(tile_key("./tiles/v1/", 42, "png"), "/tiles/v1/42.png");
        assert_eq!(tile_key("tiles/v1", 0, ".webp"), "/tiles/v1/0.webp");
        assert_eq!(tile_key("./", 7, "png"), "/7.png");
    }

    #[test]
    fn test_address_display() {
        assert_eq!(TileAddress::new("v2", 9).to_string(), "v2#9");
    }
}
