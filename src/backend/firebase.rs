//! Cloud storage + realtime database backend.
//!
//! # Responsibilities
//! - Upload GLB payloads to Storage under a content-addressed key
//! - Write component and entity records to the Realtime Database
//! - Probe the database with a shallow read
//!
//! # Design Decisions
//! - Storage key is `glbs/<sha256>.glb`, so identical payloads converge on one object
//! - The API key travels only as a query parameter and never appears in errors or logs
//! - Metadata writes use their own, shorter timeout

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::backend::http::{build_client, classify_error, is_reachable_status, rejection};
use crate::backend::{
    AssetBackend, BackendError, BackendIdentity, ComponentRecord, EntityRecord,
    ReachabilityProbe, SceneRegistry, StoreRequest, StoredAsset,
};
use crate::config::{AvailabilityConfig, FirebaseConfig, UploadConfig};

const GLB_MIME: &str = "model/gltf-binary";

/// Result of an explicit connection test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub ok: bool,
    pub message: String,
}

impl ConnectionReport {
    fn ok(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into() }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into() }
    }
}

/// Firebase Storage + Realtime Database client.
pub struct FirebaseBackend {
    identity: BackendIdentity,
    api_key: Option<String>,
    storage_bucket: String,
    storage_endpoint: Url,
    database_url: Url,
    space_id: String,
    client: Client,
    metadata_timeout: Duration,
    probe_timeout: Duration,
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, BackendError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BackendError::Configuration(format!("{} not configured", what)));
    }
    Ok(value)
}

fn parse_base(value: &str, what: &str) -> Result<Url, BackendError> {
    let url = Url::parse(value.trim_end_matches('/'))
        .map_err(|e| BackendError::Configuration(format!("invalid {}: {}", what, e)))?;
    if url.cannot_be_a_base() {
        return Err(BackendError::Configuration(format!("invalid {}: not a base URL", what)));
    }
    Ok(url)
}

fn with_segments<S: AsRef<str>>(base: &Url, segments: &[S]) -> Url {
    let mut url = base.clone();
    // parse_base rejects cannot-be-a-base URLs, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

impl FirebaseBackend {
    pub fn new(
        config: &FirebaseConfig,
        upload: &UploadConfig,
        availability: &AvailabilityConfig,
    ) -> Result<Self, BackendError> {
        let storage_bucket = required(&config.storage_bucket, "storage bucket")?.to_string();
        let database_url = parse_base(required(&config.database_url, "database URL")?, "database URL")?;
        let space_id = required(&config.space_id, "space ID")?.to_string();
        let storage_endpoint = parse_base(
            required(&config.storage_endpoint, "storage endpoint")?,
            "storage endpoint",
        )?;

        let project = if config.project_id.trim().is_empty() {
            storage_bucket.as_str()
        } else {
            config.project_id.trim()
        };
        let identity = BackendIdentity::new(format!("firebase:{}/{}", project, space_id));

        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());

        Ok(Self {
            identity,
            api_key,
            storage_bucket,
            storage_endpoint,
            database_url,
            space_id,
            client: build_client(Duration::from_secs(upload.timeout_secs))?,
            metadata_timeout: Duration::from_secs(upload.metadata_timeout_secs),
            probe_timeout: Duration::from_secs(availability.probe_timeout_secs),
        })
    }

    /// Content-addressed storage key for a payload hash.
    pub fn storage_path(content_hash: &str) -> String {
        format!("glbs/{}.glb", content_hash)
    }

    fn object_url(&self, storage_path: &str) -> Url {
        with_segments(
            &self.storage_endpoint,
            &["v0", "b", self.storage_bucket.as_str(), "o", storage_path],
        )
    }

    /// Upload endpoint for a storage path (API key excluded).
    pub fn upload_url(&self, storage_path: &str) -> Url {
        let mut url = self.object_url(storage_path);
        url.query_pairs_mut().append_pair("uploadType", "media");
        url
    }

    /// Public download URL for a storage path.
    pub fn download_url(&self, storage_path: &str) -> Url {
        let mut url = self.object_url(storage_path);
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }

    /// Database URL for `space/<space_id>/<segments...>.json`.
    pub fn database_path(&self, segments: &[&str]) -> Url {
        let mut path = vec!["space".to_string(), self.space_id.clone()];
        path.extend(segments.iter().map(|s| s.to_string()));
        if let Some(leaf) = path.last_mut() {
            leaf.push_str(".json");
        }
        with_segments(&self.database_url, &path)
    }

    fn with_auth(&self, mut url: Url, param: &str) -> Url {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair(param, key);
        }
        url
    }

    /// Unauthenticated shallow read of the database root.
    fn probe_url(&self) -> Url {
        let mut url = with_segments(&self.database_url, &[".json"]);
        url.query_pairs_mut()
            .append_pair("shallow", "true")
            .append_pair("timeout", "5s");
        url
    }

    /// Descriptive connection test for the status command.
    pub async fn test_connection(&self) -> ConnectionReport {
        if self.api_key.is_none() {
            return ConnectionReport::failed("Firebase configuration incomplete: API key missing");
        }

        match self
            .client
            .get(self.with_auth(self.probe_url(), "auth"))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => match response.status() {
                StatusCode::OK => ConnectionReport::ok("Firebase connection successful"),
                StatusCode::UNAUTHORIZED => {
                    ConnectionReport::failed("Firebase authentication failed - check API key")
                }
                status => ConnectionReport::failed(format!(
                    "Firebase connection failed: HTTP {}",
                    status.as_u16()
                )),
            },
            Err(e) if e.is_timeout() => ConnectionReport::failed("Firebase connection timeout"),
            Err(e) if e.is_connect() => {
                ConnectionReport::failed("Cannot connect to Firebase - check database URL")
            }
            Err(e) => ConnectionReport::failed(format!(
                "Firebase connection error: {}",
                e.without_url()
            )),
        }
    }

    async fn put_json<T>(&self, url: Url, body: &T, context: &str) -> Result<(), BackendError>
    where
        T: serde::Serialize + Sync,
    {
        tracing::debug!(path = url.path(), "Writing database record");

        let response = self
            .client
            .put(self.with_auth(url, "auth"))
            .json(body)
            .timeout(self.metadata_timeout)
            .send()
            .await
            .map_err(|e| classify_error(context, e))?;

        if response.status() != StatusCode::OK {
            return Err(rejection(context, response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ReachabilityProbe for FirebaseBackend {
    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    async fn probe(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.probe_url())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| classify_error("database probe", e))?;

        Ok(is_reachable_status(response.status()))
    }
}

#[async_trait]
impl AssetBackend for FirebaseBackend {
    fn kind(&self) -> &'static str {
        "firebase"
    }

    async fn store(&self, request: &StoreRequest) -> Result<StoredAsset, BackendError> {
        let storage_path = Self::storage_path(&request.content_hash);
        let url = self.upload_url(&storage_path);

        tracing::debug!(
            storage_path = %storage_path,
            bytes = request.payload.len(),
            "Uploading GLB to storage"
        );

        let response = self
            .client
            .post(self.with_auth(url, "key"))
            .header(reqwest::header::CONTENT_TYPE, GLB_MIME)
            .body(request.payload.clone())
            .send()
            .await
            .map_err(|e| classify_error("storage upload", e))?;

        if response.status() != StatusCode::OK {
            return Err(rejection("storage upload", response).await);
        }

        Ok(StoredAsset {
            location: self.download_url(&storage_path).to_string(),
            storage_path: Some(storage_path),
        })
    }

    fn registry(&self) -> Option<&dyn SceneRegistry> {
        Some(self)
    }
}

#[async_trait]
impl SceneRegistry for FirebaseBackend {
    async fn put_component(&self, record: &ComponentRecord) -> Result<(), BackendError> {
        let url = self.database_path(&["components", record.id.as_str()]);
        self.put_json(url, record, "component registration").await
    }

    async fn put_entity(&self, name: &str, record: &EntityRecord) -> Result<(), BackendError> {
        let url = self.database_path(&["Scene", name]);
        self.put_json(url, record, "entity registration").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            api_key: "AIza-test".into(),
            project_id: "demo".into(),
            storage_bucket: "demo.appspot.com".into(),
            database_url: "https://demo-default-rtdb.firebaseio.com/".into(),
            space_id: "lobby".into(),
            ..FirebaseConfig::default()
        }
    }

    fn backend() -> FirebaseBackend {
        FirebaseBackend::new(&config(), &UploadConfig::default(), &AvailabilityConfig::default())
            .unwrap()
    }

    #[test]
    fn test_storage_urls_are_content_addressed() {
        let backend = backend();
        let path = FirebaseBackend::storage_path("abc123");
        assert_eq!(path, "glbs/abc123.glb");
        assert_eq!(
            backend.upload_url(&path).as_str(),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/glbs%2Fabc123.glb?uploadType=media"
        );
        assert_eq!(
            backend.download_url(&path).as_str(),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/glbs%2Fabc123.glb?alt=media"
        );
    }

    #[test]
    fn test_database_paths() {
        let backend = backend();
        assert_eq!(
            backend.database_path(&["components", "GLTF_7"]).as_str(),
            "https://demo-default-rtdb.firebaseio.com/space/lobby/components/GLTF_7.json"
        );
        assert_eq!(
            backend.database_path(&["Scene", "Chair 01"]).as_str(),
            "https://demo-default-rtdb.firebaseio.com/space/lobby/Scene/Chair%2001.json"
        );
    }

    #[test]
    fn test_probe_url_is_unauthenticated() {
        let url = backend().probe_url();
        assert_eq!(url.path(), "/.json");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("shallow".into(), "true".into())));
        assert!(query.iter().all(|(k, _)| k != "auth"));
    }

    #[test]
    fn test_identity_falls_back_to_bucket() {
        let mut cfg = config();
        cfg.project_id.clear();
        let backend =
            FirebaseBackend::new(&cfg, &UploadConfig::default(), &AvailabilityConfig::default())
                .unwrap();
        assert_eq!(backend.identity().as_str(), "firebase:demo.appspot.com/lobby");
    }

    #[test]
    fn test_missing_bucket_is_configuration_error() {
        let mut cfg = config();
        cfg.storage_bucket.clear();
        let err = FirebaseBackend::new(&cfg, &UploadConfig::default(), &AvailabilityConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, BackendError::Configuration("storage bucket not configured".into()));
    }
}
