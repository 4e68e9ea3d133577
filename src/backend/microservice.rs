//! Custom HTTP microservice backend.
//!
//! # Responsibilities
//! - Upload GLB payloads as multipart form data to `/api/store_glb`
//! - Forward username, secret and mesh name as form fields
//! - Probe the server root for reachability
//!
//! # Design Decisions
//! - The server assigns the location (a hash); there is no component registry
//! - 413 is reported as its own rejection so users know to shrink the asset

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::backend::http::{build_client, classify_error, is_reachable_status, rejection};
use crate::backend::{
    AssetBackend, BackendError, BackendIdentity, ReachabilityProbe, StoreRequest, StoredAsset,
};
use crate::config::{AvailabilityConfig, MicroserviceConfig, UploadConfig};

const GLB_MIME: &str = "model/gltf-binary";

/// Uploads to a custom microservice.
pub struct MicroserviceBackend {
    identity: BackendIdentity,
    server_url: Url,
    username: String,
    secret: String,
    client: Client,
    probe_timeout: Duration,
}

impl MicroserviceBackend {
    pub fn new(
        config: &MicroserviceConfig,
        upload: &UploadConfig,
        availability: &AvailabilityConfig,
    ) -> Result<Self, BackendError> {
        let trimmed = config.server_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(BackendError::Configuration("server URL is not configured".into()));
        }
        let server_url = Url::parse(trimmed).map_err(|e| {
            BackendError::Configuration(format!("invalid server URL '{}': {}", trimmed, e))
        })?;

        Ok(Self {
            identity: BackendIdentity::new(trimmed),
            server_url,
            username: config.username.clone(),
            secret: config.secret.clone(),
            client: build_client(Duration::from_secs(upload.timeout_secs))?,
            probe_timeout: Duration::from_secs(availability.probe_timeout_secs),
        })
    }

    fn upload_url(&self) -> Result<Url, BackendError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Configuration("server URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "store_glb"]);
        Ok(url)
    }

    fn build_form(&self, request: &StoreRequest) -> Result<Form, BackendError> {
        let part = Part::stream_with_length(request.payload.clone(), request.payload.len() as u64)
            .file_name("model.glb")
            .mime_str(GLB_MIME)
            .map_err(|e| BackendError::Configuration(format!("invalid content type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        if !self.username.is_empty() {
            form = form.text("username", self.username.clone());
        }
        if !self.secret.is_empty() {
            form = form.text("secret", self.secret.clone());
        }
        if !request.name.is_empty() {
            form = form.text("mesh_name", request.name.clone());
        }
        Ok(form)
    }
}

/// Location reference from the server's JSON answer: `hash`, else `id`.
fn location_from_response(body: &Value) -> String {
    match body.get("hash").or_else(|| body.get("id")) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    }
}

#[async_trait]
impl ReachabilityProbe for MicroserviceBackend {
    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn probe(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.server_url.clone())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| classify_error("server probe", e))?;

        let reachable = is_reachable_status(response.status());
        if !reachable {
            tracing::warn!(status = %response.status(), "Server probe returned server error");
        }
        Ok(reachable)
    }
}

#[async_trait]
impl AssetBackend for MicroserviceBackend {
    fn kind(&self) -> &'static str {
        "microservice"
    }

    async fn store(&self, request: &StoreRequest) -> Result<StoredAsset, BackendError> {
        let url = self.upload_url()?;
        let form = self.build_form(request)?;

        tracing::debug!(
            path = url.path(),
            bytes = request.payload.len(),
            name = %request.name,
            "Uploading GLB to microservice"
        );

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_error("upload", e))?;

        let status = response.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: "upload: file too large for server".into(),
            });
        }
        if !status.is_success() {
            return Err(rejection("upload", response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| BackendError::InvalidResponse("server returned a non-JSON body".into()))?;

        Ok(StoredAsset {
            location: location_from_response(&body),
            storage_path: None,
        })
    }
}
