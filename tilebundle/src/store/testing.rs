//! In-process object store for unit tests.

use super::client::{normalize_request_path, ObjectStore};
use super::types::{StoreError, StoreResponse};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves objects from a map, counts calls, and fails chosen paths.
#[derive(Default)]
pub struct MockObjectStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, path: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .insert(normalize_request_path(path), body.into());
    }

    /// Makes requests for `path` fail with HTTP 500.
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(normalize_request_path(path));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    /// Highest number of requests that were in progress at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MockObjectStore {
    async fn signed_get(
        &self,
        path: &str,
        _query: &[(&str, &str)],
    ) -> Result<StoreResponse, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = normalize_request_path(path);
        self.requested.lock().push(path.clone());

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().contains(&path) {
            return Err(StoreError::Remote { status: 500, path });
        }

        let body = self.objects.lock().get(&path).cloned();
        match body {
            Some(body) => Ok(StoreResponse::ok(body)),
            None => Err(StoreError::Remote { status: 404, path }),
        }
    }
}
