//! Tile bundles.
//!
//! A bundle is the set of tiles for one version and index set, identified
//! by a hash of the version and the sorted, deduplicated indices.
//! [`BundleBuilder`] fetches tiles concurrently, tolerates partial failure,
//! and caches the result; [`frame`] defines the binary wire format.
//!
//! ```ignore
//! let bundle = builder.build_bundle("v3", &[12, 10, 11], TileEncoding::Raw).await?;
//! ```

mod builder;
mod coalesce;
pub mod frame;
mod id;
mod types;

pub use builder::{bundle_cache_key, BundleBuilder, BundleConfig, DEFAULT_BUNDLE_TTL};
pub use coalesce::{BundleCoalescer, CoalescerStats};
pub use frame::{decode_binary, encode_binary, DecodedFrame, FrameError};
pub use id::{bundle_id, normalize_indices};
pub use types::{
    Bundle, BundleError, EncodedBundle, EncodedPayload, EncodedTile, TileEncoding, TileRecord,
};
