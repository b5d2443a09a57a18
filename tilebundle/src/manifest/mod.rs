//! Version manifest: document format, parsing and cache-first loading.

mod loader;
mod parser;
mod types;
mod writer;

pub use loader::{
    ManifestConfig, ManifestLoader, DEFAULT_MANIFEST_PATH, DEFAULT_MANIFEST_TTL,
    MANIFEST_CACHE_KEY,
};
pub use parser::{parse_document, parse_manifest, RawManifest};
pub use types::{Manifest, ManifestError, VersionId, VersionInfo};
pub use writer::write_manifest;
