//! Time-windowed cache of backend reachability.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::backend::{BackendIdentity, ReachabilityProbe};
use crate::observability::metrics;

/// Default freshness window.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(10);

/// Outcome of the last live probe for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedStatus {
    pub reachable: bool,
    pub checked_at: Instant,
}

impl CachedStatus {
    /// Age of this entry.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.checked_at)
    }
}

/// A thread-safe, read-through cache of reachability checks.
///
/// Entries are keyed by [`BackendIdentity`] and stay fresh for a fixed
/// window; failed probes are cached exactly like successful ones.
#[derive(Clone)]
pub struct AvailabilityCache {
    inner: Arc<DashMap<BackendIdentity, CachedStatus>>,
    freshness: Duration,
}

impl AvailabilityCache {
    /// Create an empty cache with the given freshness window.
    pub fn new(freshness: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            freshness,
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Cached reachability for `probe`, running a live probe when the entry
    /// is missing or stale.
    pub async fn get_status<P>(&self, probe: &P) -> bool
    where
        P: ReachabilityProbe + ?Sized,
    {
        let identity = probe.identity();

        if let Some(status) = self.fresh_entry(identity) {
            metrics::record_cache_lookup(true);
            return status.reachable;
        }
        metrics::record_cache_lookup(false);

        // No map guard is held across the probe.
        let reachable = match probe.probe().await {
            Ok(reachable) => reachable,
            Err(e) => {
                tracing::warn!(backend = %identity, error = %e, "Reachability probe failed");
                false
            }
        };

        self.inner.insert(
            identity.clone(),
            CachedStatus {
                reachable,
                checked_at: Instant::now(),
            },
        );
        metrics::record_backend_health(identity.as_str(), reachable);
        tracing::debug!(backend = %identity, reachable, "Reachability cached");

        reachable
    }

    fn fresh_entry(&self, identity: &BackendIdentity) -> Option<CachedStatus> {
        let status = *self.inner.get(identity)?.value();
        (status.age() < self.freshness).then_some(status)
    }

    /// Read the cached entry without probing, fresh or not.
    pub fn peek(&self, identity: &BackendIdentity) -> Option<CachedStatus> {
        self.inner.get(identity).map(|r| *r.value())
    }

    /// Drop the entry for `identity`; the next lookup probes live.
    pub fn invalidate(&self, identity: &BackendIdentity) {
        if self.inner.remove(identity).is_some() {
            tracing::debug!(backend = %identity, "Reachability cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of cached backends.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS)
    }
}
