//! Upload results, errors and progress stages.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::backend::{BackendError, ComponentId};

/// A completed logical upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub name: String,
    /// Location reference returned by the backend.
    pub location: String,
    /// Lowercase hex SHA-256 of the payload.
    pub content_hash: String,
    /// Payload length in bytes.
    pub size_bytes: usize,
    /// Component minted on the successful attempt, for backends with a registry.
    pub component_id: Option<ComponentId>,
    /// Store attempts used, including the successful one.
    pub attempts: u32,
}

/// Why a logical upload failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("backend {0} is unreachable")]
    Unreachable(String),

    #[error("upload failed after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("upload rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The payload is stored but its component record could not be written.
    #[error("component registration failed for stored asset {location}: {message}")]
    ComponentRegistration { location: String, message: String },

    /// Payload and component exist but the entity could not be written.
    #[error("entity registration failed for component {component_id}: {message}")]
    EntityRegistration {
        component_id: ComponentId,
        message: String,
    },
}

impl UploadError {
    /// True when the payload was stored but metadata writes failed.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            UploadError::ComponentRegistration { .. } | UploadError::EntityRegistration { .. }
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Configuration(_) => "configuration",
            UploadError::PayloadTooLarge { .. } => "payload_too_large",
            UploadError::Unreachable(_) => "unreachable",
            UploadError::Transport { .. } => "transport",
            UploadError::Rejected { .. } => "rejected",
            UploadError::InvalidResponse(_) => "invalid_response",
            UploadError::ComponentRegistration { .. } => "component_registration",
            UploadError::EntityRegistration { .. } => "entity_registration",
        }
    }

    /// Map a non-retryable store failure.
    pub(crate) fn from_store(err: BackendError, attempts: u32) -> Self {
        match err {
            BackendError::Configuration(msg) => UploadError::Configuration(msg),
            BackendError::Transport(message) => UploadError::Transport { attempts, message },
            BackendError::Rejected { status, message } => UploadError::Rejected { status, message },
            BackendError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
        }
    }
}

/// Progress of a logical upload, reported to logs and the progress callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStage {
    Pending,
    Uploading { attempt: u32, max_retries: u32 },
    UploadFailed { attempt: u32, message: String },
    Uploaded { attempts: u32 },
    RegisteringComponent,
    ComponentRegistered,
    RegisteringEntity,
    Failed { message: String },
    Done,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::Pending => f.write_str("pending"),
            UploadStage::Uploading { attempt, max_retries } => {
                write!(f, "uploading (attempt {}/{})", attempt, max_retries)
            }
            UploadStage::UploadFailed { attempt, message } => {
                write!(f, "attempt {} failed: {}", attempt, message)
            }
            UploadStage::Uploaded { attempts } => write!(f, "uploaded after {} attempt(s)", attempts),
            UploadStage::RegisteringComponent => f.write_str("registering component"),
            UploadStage::ComponentRegistered => f.write_str("component registered"),
            UploadStage::RegisteringEntity => f.write_str("registering entity"),
            UploadStage::Failed { message } => write!(f, "failed: {}", message),
            UploadStage::Done => f.write_str("done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failures() {
        let component = UploadError::ComponentRegistration {
            location: "https://x/o/glbs%2Fab.glb?alt=media".into(),
            message: "component registration: Permission denied".into(),
        };
        assert!(component.is_partial());
        assert!(component.to_string().starts_with("component registration failed"));

        let entity = UploadError::EntityRegistration {
            component_id: ComponentId::from("GLTF_1"),
            message: "entity registration: HTTP 500".into(),
        };
        assert!(entity.is_partial());

        let transport = UploadError::Transport { attempts: 3, message: "timed out".into() };
        assert!(!transport.is_partial());
        assert_eq!(transport.to_string(), "upload failed after 3 attempt(s): timed out");
    }

    #[test]
    fn test_from_store_keeps_status() {
        let err = UploadError::from_store(
            BackendError::Rejected { status: 413, message: "upload: file too large for server".into() },
            1,
        );
        assert_eq!(
            err,
            UploadError::Rejected { status: 413, message: "upload: file too large for server".into() }
        );
        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            UploadStage::Uploading { attempt: 2, max_retries: 3 }.to_string(),
            "uploading (attempt 2/3)"
        );
        assert_eq!(UploadStage::Done.to_string(), "done");
    }
}
