//! Tile fetching.
//!
//! A tile is one object in the store, keyed by its version's storage path
//! and its linear index:
//!
//! ```text
//! /{storage path}/{index}.{extension}
//! ```
//!
//! [`TileFetcher`] validates the index against the manifest before any
//! request is made.

mod error;
mod fetcher;
mod request;

pub use error::TileError;
pub use fetcher::TileFetcher;
pub use request::{normalize_storage_path, tile_key, TileAddress, DEFAULT_TILE_EXTENSION};
