//! GLB asset publishing library.
//!
//! Uploads exported GLB assets to a storage backend with retries, registers
//! them as scene components, and caches backend reachability.

// Core subsystems
pub mod backend;
pub mod config;
pub mod upload;

// Asset preparation
pub mod export;
pub mod history;

// Cross-cutting concerns
pub mod availability;
pub mod observability;
pub mod resilience;

pub use availability::AvailabilityCache;
pub use backend::{AssetBackend, BackendError, BackendIdentity};
pub use config::UploaderConfig;
pub use upload::{UploadError, UploadOutcome, UploadRequest, UploadSession, Uploader};
