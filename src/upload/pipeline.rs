//! Upload-with-retry pipeline.
//!
//! # Responsibilities
//! - Enforce the payload ceiling before any network call
//! - Retry the binary store on transport failures with exponential backoff
//! - Register the component and entity exactly once after a successful store
//! - Report every stage to `tracing` and the optional progress callback
//!
//! # Design Decisions
//! - Attempts are strictly sequential; the payload is shared as `Bytes`
//! - A fresh component id is minted per attempt, only the winning one is registered
//! - Metadata failures are partial failures and are never retried

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{AssetBackend, ComponentId, ComponentRecord, EntityRecord, StoreRequest};
use crate::config::UploadConfig;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::upload::outcome::{UploadError, UploadOutcome, UploadStage};
use crate::upload::placement::Placement;

/// Callback receiving every stage transition.
pub type ProgressCallback = Arc<dyn Fn(&UploadStage) + Send + Sync>;

/// One asset to publish.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub payload: Bytes,
    /// Entity transform; identity when absent.
    pub placement: Option<Placement>,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            placement: None,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

/// Lowercase hex SHA-256 of a payload.
pub fn content_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Publishes GLB payloads to one backend.
#[derive(Clone)]
pub struct Uploader {
    backend: Arc<dyn AssetBackend>,
    policy: RetryPolicy,
    max_payload_bytes: usize,
    progress: Option<ProgressCallback>,
}

impl Uploader {
    pub fn new(backend: Arc<dyn AssetBackend>, policy: RetryPolicy, max_payload_bytes: usize) -> Self {
        Self {
            backend,
            policy,
            max_payload_bytes,
            progress: None,
        }
    }

    pub fn from_config(backend: Arc<dyn AssetBackend>, config: &UploadConfig) -> Self {
        let ceiling = usize::try_from(config.max_payload_bytes()).unwrap_or(usize::MAX);
        Self::new(backend, RetryPolicy::from_config(config), ceiling)
    }

    /// Attach a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadStage) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn backend(&self) -> &Arc<dyn AssetBackend> {
        &self.backend
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    fn report(&self, stage: UploadStage) {
        tracing::debug!(stage = %stage, "Upload stage");
        if let Some(callback) = &self.progress {
            callback(&stage);
        }
    }

    fn fail(&self, err: UploadError) -> UploadError {
        self.report(UploadStage::Failed {
            message: err.to_string(),
        });
        err
    }

    /// Publish one asset: store with retries, then register component and entity.
    pub async fn publish(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        let span = tracing::info_span!(
            "upload",
            upload_id = %Uuid::new_v4(),
            name = %request.name,
            backend = self.backend.kind()
        );
        let start = Instant::now();

        let result = self.run(request).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_upload(self.backend.kind(), outcome, start);
        result
    }

    async fn run(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        self.report(UploadStage::Pending);

        if request.name.trim().is_empty() {
            return Err(self.fail(UploadError::Configuration("asset name is empty".into())));
        }
        let size = request.payload.len();
        if size > self.max_payload_bytes {
            return Err(self.fail(UploadError::PayloadTooLarge {
                size,
                limit: self.max_payload_bytes,
            }));
        }

        let store_request = StoreRequest {
            content_hash: content_hash(&request.payload),
            name: request.name,
            payload: request.payload,
        };
        tracing::info!(bytes = size, content_hash = %store_request.content_hash, "Upload started");

        let kind = self.backend.kind();
        let max_retries = self.policy.max_retries();
        let mut last_error = String::new();
        let mut stored = None;

        for attempt in 1..=max_retries {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }

            let component_id = ComponentId::mint();
            self.report(UploadStage::Uploading { attempt, max_retries });

            match self.backend.store(&store_request).await {
                Ok(asset) => {
                    metrics::record_upload_attempt(kind, "success");
                    stored = Some((attempt, component_id, asset));
                    break;
                }
                Err(e) if e.is_retryable() => {
                    metrics::record_upload_attempt(kind, "transport_error");
                    tracing::warn!(attempt, max_retries, error = %e, "Store attempt failed");
                    last_error = e.to_string();
                    self.report(UploadStage::UploadFailed {
                        attempt,
                        message: last_error.clone(),
                    });
                }
                Err(e) => {
                    metrics::record_upload_attempt(kind, "rejected");
                    tracing::warn!(attempt, error = %e, "Store rejected, not retrying");
                    return Err(self.fail(UploadError::from_store(e, attempt)));
                }
            }
        }

        let Some((attempts, component_id, asset)) = stored else {
            return Err(self.fail(UploadError::Transport {
                attempts: max_retries,
                message: last_error,
            }));
        };
        self.report(UploadStage::Uploaded { attempts });
        tracing::info!(attempts, location = %asset.location, "Payload stored");

        let Some(registry) = self.backend.registry() else {
            self.report(UploadStage::Done);
            return Ok(UploadOutcome {
                name: store_request.name,
                location: asset.location,
                content_hash: store_request.content_hash,
                size_bytes: size,
                component_id: None,
                attempts,
            });
        };

        self.report(UploadStage::RegisteringComponent);
        let component = ComponentRecord {
            id: component_id.clone(),
            url: asset.location.clone(),
        };
        if let Err(e) = registry.put_component(&component).await {
            tracing::error!(component_id = %component_id, error = %e, "Component registration failed");
            return Err(self.fail(UploadError::ComponentRegistration {
                location: asset.location,
                message: e.to_string(),
            }));
        }
        self.report(UploadStage::ComponentRegistered);

        self.report(UploadStage::RegisteringEntity);
        let entity = EntityRecord::new(&component_id, &request.placement.unwrap_or_default());
        if let Err(e) = registry.put_entity(&store_request.name, &entity).await {
            tracing::error!(component_id = %component_id, error = %e, "Entity registration failed");
            return Err(self.fail(UploadError::EntityRegistration {
                component_id,
                message: e.to_string(),
            }));
        }

        self.report(UploadStage::Done);
        tracing::info!(component_id = %component_id, "Upload complete");

        Ok(UploadOutcome {
            name: store_request.name,
            location: asset.location,
            content_hash: store_request.content_hash,
            size_bytes: size,
            component_id: Some(component_id),
            attempts,
        })
    }
}
