//! Cache capability for manifests and bundles.
//!
//! Components take a [`CacheStore`] rather than reaching for a global, so a
//! remote cache service and the in-process [`MemoryCache`] are
//! interchangeable.

mod memory;
mod r#trait;
mod types;

pub use memory::{MemoryCache, MAX_ENTRY_TTL};
pub use r#trait::{CacheStore, NoOpCache};
pub use types::{CacheError, CacheStats};
