//! Request signing for the object store.
//!
//! The store accepts the legacy `AWS {access}:{signature}` scheme: an
//! HMAC-SHA1 over a newline separated canonical string, base64 encoded.
//!
//! ```text
//! GET\n
//! {content-md5}\n
//! {content-type}\n
//! {date}\n
//! /{bucket}{path}[?{query}]
//! ```

use super::types::{Credentials, StoreError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// RFC 1123 date format used in both the `Date` header and the signature.
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats a timestamp as an RFC 1123 HTTP date.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format(RFC1123_FORMAT).to_string()
}

/// The parts of a request that participate in the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub content_md5: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub date: &'a str,
    pub bucket: &'a str,
    /// Object path, starting with `/`
    pub path: &'a str,
    /// Already-encoded query string without the leading `?`
    pub query: Option<&'a str>,
}

impl<'a> CanonicalRequest<'a> {
    /// A GET with no body, which is all the engine issues.
    pub fn get(date: &'a str, bucket: &'a str, path: &'a str, query: Option<&'a str>) -> Self {
        Self {
            method: "GET",
            content_md5: None,
            content_type: None,
            date,
            bucket,
            path,
            query,
        }
    }

    /// `/{bucket}{path}[?{query}]`
    pub fn resource(&self) -> String {
        let mut resource = format!("/{}{}", self.bucket, self.path);
        if let Some(query) = self.query.filter(|q| !q.is_empty()) {
            resource.push('?');
            resource.push_str(query);
        }
        resource
    }

    /// The exact string fed to the HMAC.
    pub fn string_to_sign(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}",
            self.method,
            self.content_md5.unwrap_or(""),
            self.content_type.unwrap_or(""),
            self.date,
            self.resource()
        )
    }
}

/// Produces the `Authorization` header for a request.
///
/// Pluggable so alternative schemes (or fixed test signatures) can be
/// swapped in without touching the client.
pub trait RequestSigner: Send + Sync {
    fn authorization(&self, request: &CanonicalRequest<'_>) -> Result<String, StoreError>;
}

/// HMAC-SHA1 signer compatible with the existing object store.
#[derive(Debug, Clone)]
pub struct HmacSha1Signer {
    credentials: Credentials,
}

impl HmacSha1Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// base64(HMAC-SHA1(secret, string_to_sign))
    pub fn signature(&self, request: &CanonicalRequest<'_>) -> Result<String, StoreError> {
        let mut mac = HmacSha1::new_from_slice(self.credentials.secret_key().as_bytes())
            .map_err(|e| StoreError::Configuration(format!("invalid secret key: {}", e)))?;
        mac.update(request.string_to_sign().as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl RequestSigner for HmacSha1Signer {
    fn authorization(&self, request: &CanonicalRequest<'_>) -> Result<String, StoreError> {
        let signature = self.signature(request)?;
        Ok(format!(
            "AWS {}:{}",
            self.credentials.access_key(),
            signature
        ))
    }
}
