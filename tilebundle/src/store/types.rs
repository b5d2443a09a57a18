//! Object store types and errors.

use bytes::Bytes;
use thiserror::Error;

/// Errors returned by the object store client.
///
/// The client never retries; callers decide whether a failure is worth
/// another attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Credentials or endpoint settings are missing.
    #[error("object store configuration error: {0}")]
    Configuration(String),

    /// The store answered with a non-2xx status.
    #[error("object store returned HTTP {status} for {path}")]
    Remote { status: u16, path: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("object store request failed: {0}")]
    Http(String),

    /// A listing response could not be parsed.
    #[error("invalid listing response: {0}")]
    InvalidListing(String),
}

impl StoreError {
    /// HTTP status of a remote failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Response to a successful signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Response headers as lowercase name/value pairs
    pub headers: Vec<(String, String)>,
    /// Raw response body
    pub body: Bytes,
}

impl StoreResponse {
    /// Creates a 200 response with no headers.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Access/secret key pair for request signing.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Creates credentials, rejecting empty keys.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if access_key.trim().is_empty() {
            return Err(StoreError::Configuration(
                "access key is missing".to_string(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(StoreError::Configuration(
                "secret key is missing".to_string(),
            ));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    /// Builds credentials from optional settings values.
    pub fn from_optional(
        access_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Result<Self, StoreError> {
        match (access_key, secret_key) {
            (Some(access), Some(secret)) => Self::new(access, secret),
            _ => Err(StoreError::Configuration(
                "access key and secret key must both be set".to_string(),
            )),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
