//! Availability-aware upload session.

use std::sync::Arc;

use crate::availability::{AvailabilityCache, CachedStatus};
use crate::backend::AssetBackend;
use crate::upload::batch::BatchReport;
use crate::upload::outcome::{UploadError, UploadOutcome};
use crate::upload::pipeline::{UploadRequest, Uploader};

/// Binds an uploader to an availability cache and checks reachability
/// before publishing. `status()` serves polling callers from the cache;
/// publishing always probes live.
#[derive(Clone)]
pub struct UploadSession {
    uploader: Uploader,
    cache: AvailabilityCache,
}

impl UploadSession {
    pub fn new(uploader: Uploader, cache: AvailabilityCache) -> Self {
        Self { uploader, cache }
    }

    pub fn backend(&self) -> &Arc<dyn AssetBackend> {
        self.uploader.backend()
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }

    /// Cached reachability of the session's backend.
    pub async fn status(&self) -> bool {
        self.cache.get_status(self.backend().as_ref()).await
    }

    /// Drop the cached entry and probe live.
    pub async fn refresh(&self) -> bool {
        self.cache.invalidate(self.backend().identity());
        self.status().await
    }

    /// Last cached status, without probing.
    pub fn last_status(&self) -> Option<CachedStatus> {
        self.cache.peek(self.backend().identity())
    }

    /// Live check before an upload; the result also refreshes the cache.
    async fn preflight(&self) -> Result<(), UploadError> {
        if self.refresh().await {
            return Ok(());
        }
        let identity = self.backend().identity().to_string();
        tracing::warn!(backend = %identity, "Backend unreachable, upload skipped");
        Err(UploadError::Unreachable(identity))
    }

    /// Publish one asset if the backend is reachable.
    pub async fn publish(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        self.preflight().await?;
        self.uploader.publish(request).await
    }

    /// One preflight, then the whole batch.
    pub async fn publish_batch<I>(&self, items: I, skip_failed: bool) -> Result<BatchReport, UploadError>
    where
        I: IntoIterator<Item = UploadRequest>,
    {
        self.preflight().await?;
        Ok(self.uploader.publish_batch(items, skip_failed).await)
    }
}
