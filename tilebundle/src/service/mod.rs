//! High-level service facade.
//!
//! Wires the object store, cache, manifest loader, tile fetcher, bundle
//! builder and preloader from one [`ServiceConfig`].
//!
//! ```ignore
//! use tilebundle::config::ConfigFile;
//! use tilebundle::service::TileAssetService;
//! use tilebundle::bundle::TileEncoding;
//!
//! let service = TileAssetService::from_config_file(&ConfigFile::load()?)?;
//! let latest = service.get_latest_version().await?;
//! let bundle = service.build_bundle(&latest, &[0, 1, 2], TileEncoding::Base64).await?;
//! ```

mod config;
mod error;
mod facade;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use facade::TileAssetService;
