//! Object store client.
//!
//! Issues HMAC-SHA1 signed GET requests against the blob store holding tiles
//! and the version manifest, and parses prefix listings.
//!
//! ```ignore
//! use tilebundle::store::{Credentials, ObjectStore, ReqwestObjectStore, StoreConfig};
//!
//! let config = StoreConfig::new("https://objects.example.com", "maps")
//!     .with_credentials(Credentials::new(access, secret)?);
//! let store = ReqwestObjectStore::new(config)?;
//! let response = store.signed_get("/mapversions.yml", &[]).await?;
//! ```

mod client;
mod listing;
mod signer;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ObjectStore, ReqwestObjectStore, StoreConfig, DEFAULT_STORE_TIMEOUT};
pub use listing::{list_objects, parse_listing, ObjectEntry};
pub use signer::{http_date, CanonicalRequest, HmacSha1Signer, RequestSigner};
pub use types::{Credentials, StoreError, StoreResponse};
