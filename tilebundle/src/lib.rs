//! tilebundle - tile asset distribution and bundling
//!
//! Serves a large pre-rendered map as a grid of image tiles kept in an
//! object store. The crate signs store requests, loads and caches the
//! version manifest, maps tile indices to grid coordinates, fetches single
//! tiles, builds cached multi-tile bundles, and preloads whole versions.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module wires everything together:
//!
//! ```ignore
//! use tilebundle::bundle::TileEncoding;
//! use tilebundle::config::ConfigFile;
//! use tilebundle::service::TileAssetService;
//!
//! let service = TileAssetService::from_config_file(&ConfigFile::load()?)?;
//! let version = service.get_latest_version().await?;
//! let bundle = service.build_bundle(&version, &[3, 1, 2], TileEncoding::Raw).await?;
//! ```

pub mod bundle;
pub mod cache;
pub mod config;
pub mod grid;
pub mod logging;
pub mod manifest;
pub mod preload;
pub mod service;
pub mod store;
pub mod tile;

/// Version of the tilebundle library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
