//! Signed HTTP client for the object store.

use super::signer::{http_date, CanonicalRequest, HmacSha1Signer, RequestSigner};
use super::types::{Credentials, StoreError, StoreResponse};
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, DATE};
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default request timeout for object store calls.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated read access to the object store.
///
/// Implementations return `Ok` only for 2xx responses. Anything else is a
/// [`StoreError::Remote`] carrying the status.
pub trait ObjectStore: Send + Sync {
    /// Performs a signed GET for `path` (leading `/` optional) with the given
    /// query parameters, in order.
    fn signed_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<StoreResponse, StoreError>> + Send;
}

/// Connection settings for the object store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL, e.g. `https://objects.example.com`
    pub endpoint: String,
    /// Bucket name, part of both the URL and the signed resource
    pub bucket: String,
    /// Credentials; requests fail with a configuration error when absent
    pub credentials: Option<Credentials>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            credentials: None,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Ensures object paths start with exactly one `/`.
pub(crate) fn normalize_request_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// reqwest-backed [`ObjectStore`].
#[derive(Clone)]
pub struct ReqwestObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl ReqwestObjectStore {
    /// Creates a client from connection settings.
    ///
    /// Missing credentials are not an error here; they surface as
    /// [`StoreError::Configuration`] on the first request.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        if config.endpoint.trim().is_empty() {
            return Err(StoreError::Configuration(
                "object store endpoint is empty".to_string(),
            ));
        }
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Configuration(
                "object store bucket is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| StoreError::Http(format!("Failed to create HTTP client: {}", e)))?;

        let signer = config
            .credentials
            .map(|c| Arc::new(HmacSha1Signer::new(c)) as Arc<dyn RequestSigner>);

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket,
            signer,
        })
    }

    /// Replaces the request signer.
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// `{endpoint}/{bucket}{path}` with query parameters appended.
    pub fn request_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let raw = format!("{}/{}{}", self.endpoint, self.bucket, path);
        let mut url = Url::parse(&raw)
            .map_err(|e| StoreError::Configuration(format!("invalid URL '{}': {}", raw, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    /// Object path as sent on the wire, percent-encoded and without the
    /// endpoint's own path or the bucket segment.
    pub fn signed_path(&self, url: &Url) -> Result<String, StoreError> {
        let base = self.request_url("", &[])?;
        url.path()
            .strip_prefix(base.path())
            .map(normalize_request_path)
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "URL '{}' is outside bucket '{}'",
                    url, self.bucket
                ))
            })
    }
}

impl ObjectStore for ReqwestObjectStore {
    async fn signed_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<StoreResponse, StoreError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            StoreError::Configuration("access key and secret key are not configured".to_string())
        })?;

        let path = normalize_request_path(path);
        let url = self.request_url(&path, query)?;
        let signed_path = self.signed_path(&url)?;
        let date = http_date(Utc::now());
        let canonical = CanonicalRequest::get(&date, &self.bucket, &signed_path, url.query());
        let authorization = signer.authorization(&canonical)?;

        trace!(path = %path, "Signed GET starting");

        let response = match self
            .client
            .get(url.clone())
            .header(DATE, &date)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    path = %path,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "Object store request failed"
                );
                return Err(StoreError::Http(format!("Request failed: {}", e)));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(path = %path, status = status.as_u16(), "Object store error status");
            return Err(StoreError::Remote {
                status: status.as_u16(),
                path,
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Http(format!("Failed to read response: {}", e)))?;

        trace!(path = %path, bytes = body.len(), "Signed GET complete");

        Ok(StoreResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
