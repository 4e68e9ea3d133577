//! Upload backends.
//!
//! # Data Flow
//! ```text
//! UploaderConfig.backend
//!     → from_config() builds one backend:
//!         microservice.rs  (multipart POST, server-assigned hash)
//!         firebase.rs      (content-addressed storage + realtime database records)
//!     → shared via Arc<dyn AssetBackend> with the uploader and availability cache
//! ```
//!
//! # Design Decisions
//! - Every backend is a `ReachabilityProbe`; the availability cache keys on its identity
//! - Component/entity registration is an optional capability (`registry()`)
//! - Only transport errors are retryable; rejections carry the backend's message
//! - Error text never contains credentials or full request URLs

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendKind, UploaderConfig};

pub mod firebase;
pub mod http;
pub mod microservice;
pub mod records;

pub use firebase::FirebaseBackend;
pub use microservice::MicroserviceBackend;
pub use records::{ComponentId, ComponentRecord, EntityRecord, StoreRequest, StoredAsset};

/// Key identifying a configured upload destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendIdentity(String);

impl BackendIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors returned by backend operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Missing or invalid configuration, detected before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Timeout, refused connection or similar network failure.
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The backend answered 2xx with a body we could not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}

/// Anything whose reachability can be checked and cached.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Cache key for this destination.
    fn identity(&self) -> &BackendIdentity;

    /// Live check. `Ok(false)` means the backend answered with a server error.
    async fn probe(&self) -> Result<bool, BackendError>;
}

/// A destination that stores GLB payloads.
#[async_trait]
pub trait AssetBackend: ReachabilityProbe {
    /// Short backend name used in logs and metrics.
    fn kind(&self) -> &'static str;

    /// Store the payload (step 1 of an upload).
    async fn store(&self, request: &StoreRequest) -> Result<StoredAsset, BackendError>;

    /// Component/entity registry, for backends that model scenes.
    fn registry(&self) -> Option<&dyn SceneRegistry> {
        None
    }
}

/// Metadata writes that follow a successful store (steps 2 and 3).
#[async_trait]
pub trait SceneRegistry: Send + Sync {
    /// Create or overwrite a component record.
    async fn put_component(&self, record: &ComponentRecord) -> Result<(), BackendError>;

    /// Create or overwrite the entity record stored under `name`.
    async fn put_entity(&self, name: &str, record: &EntityRecord) -> Result<(), BackendError>;
}

/// Build the backend selected by the configuration.
pub fn from_config(config: &UploaderConfig) -> Result<Arc<dyn AssetBackend>, BackendError> {
    let backend: Arc<dyn AssetBackend> = match config.backend {
        BackendKind::Microservice => Arc::new(MicroserviceBackend::new(
            &config.microservice,
            &config.upload,
            &config.availability,
        )?),
        BackendKind::Firebase => Arc::new(FirebaseBackend::new(
            &config.firebase,
            &config.upload,
            &config.availability,
        )?),
    };

    tracing::info!(
        backend = backend.kind(),
        identity = %backend.identity(),
        "Backend configured"
    );
    Ok(backend)
}
