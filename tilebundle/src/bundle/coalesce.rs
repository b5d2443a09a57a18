//! Single-flight coalescing of bundle builds.
//!
//! ```text
//! build(id) A ─┐
//!              │                               fetch fan-out
//! build(id) B ─┼──► BundleCoalescer ─────────► (leader only)
//!              │        │                          │
//! build(id) C ─┘        ▼                          ▼
//!               [B, C wait on the   ◄──────── leader completes
//!                leader's broadcast]
//! ```
//!
//! The first caller for a bundle id becomes the leader and builds; later
//! callers subscribe to its result. If the leader is dropped before it
//! completes, its entry is removed and the channel closes, so waiters can
//! retry instead of hanging.

use super::types::{Bundle, BundleError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

pub(crate) type BuildResult = Result<Arc<Bundle>, BundleError>;

type InFlight = Arc<Mutex<HashMap<String, broadcast::Sender<BuildResult>>>>;

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Total builds requested
    pub total_requests: u64,
    /// Requests that waited for an in-flight build
    pub coalesced_requests: u64,
    /// Requests that started a build
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Tracks in-flight bundle builds by bundle id.
#[derive(Default)]
pub struct BundleCoalescer {
    in_flight: InFlight,
    stats: Mutex<CoalescerStats>,
}

/// Outcome of registering a build.
pub(crate) enum Registration {
    /// Caller must build and call [`Leader::complete`]
    Leader(Leader),
    /// Another build is running; wait for its result
    Waiter(broadcast::Receiver<BuildResult>),
}

impl BundleCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, bundle_id: &str) -> Registration {
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();
        stats.total_requests += 1;

        if let Some(tx) = in_flight.get(bundle_id) {
            stats.coalesced_requests += 1;
            debug!(bundle_id, "Coalescing bundle build");
            return Registration::Waiter(tx.subscribe());
        }

        // Typical case is a handful of concurrent requests for one bundle
        let (tx, _rx) = broadcast::channel(16);
        in_flight.insert(bundle_id.to_string(), tx.clone());
        stats.new_requests += 1;
        debug!(
            bundle_id,
            in_flight_count = in_flight.len(),
            "Starting bundle build"
        );

        Registration::Leader(Leader {
            bundle_id: bundle_id.to_string(),
            sender: tx,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn stats(&self) -> CoalescerStats {
        *self.stats.lock()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

/// Held by the caller that runs a build.
pub(crate) struct Leader {
    bundle_id: String,
    sender: broadcast::Sender<BuildResult>,
    in_flight: InFlight,
}

impl Leader {
    /// Publishes the result to every waiter and clears the entry.
    pub(crate) fn complete(self, result: BuildResult) {
        self.remove_entry();
        let waiters = self.sender.receiver_count();
        // No receivers is fine
        let _ = self.sender.send(result);
        if waiters > 0 {
            debug!(bundle_id = %self.bundle_id, waiters, "Broadcast bundle to waiters");
        }
    }

    fn remove_entry(&self) {
        let mut in_flight = self.in_flight.lock();
        let ours = in_flight
            .get(&self.bundle_id)
            .is_some_and(|tx| tx.same_channel(&self.sender));
        if ours {
            in_flight.remove(&self.bundle_id);
        }
    }
}

impl Drop for Leader {
    fn drop(&mut self) {
        self.remove_entry();
    }
}
