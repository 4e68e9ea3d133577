//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the uploader.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::export::ExportPreset;

/// Root configuration for the uploader.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UploaderConfig {
    /// Which backend target receives uploads.
    pub backend: BackendKind,

    /// Custom HTTP microservice settings.
    pub microservice: MicroserviceConfig,

    /// Cloud storage + realtime database settings.
    pub firebase: FirebaseConfig,

    /// Upload, retry and size limits.
    pub upload: UploadConfig,

    /// Availability cache settings.
    pub availability: AvailabilityConfig,

    /// Export preset selection and custom export settings.
    pub export: ExportConfig,

    /// Local upload history.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend target selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Microservice,
    Firebase,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Microservice => write!(f, "microservice"),
            BackendKind::Firebase => write!(f, "firebase"),
        }
    }
}

/// Microservice backend configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MicroserviceConfig {
    /// Base URL of the microservice (e.g., "http://localhost:8000").
    pub server_url: String,

    /// Username sent with each upload.
    pub username: String,

    /// Secret sent with each upload.
    pub secret: String,
}

impl Default for MicroserviceConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            username: String::new(),
            secret: String::new(),
        }
    }
}

// Credentials stay out of Debug output so configs can be logged.
impl std::fmt::Debug for MicroserviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroserviceConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("secret", &redacted(&self.secret))
            .finish()
    }
}

/// Firebase project configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,

    /// Storage bucket (e.g., "your-project.appspot.com").
    pub storage_bucket: String,

    pub messaging_sender_id: String,
    pub app_id: String,

    /// Realtime database URL (e.g., "https://your-project-default-rtdb.firebaseio.com").
    pub database_url: String,

    /// Space identifier under which components and entities are written.
    pub space_id: String,

    /// Storage REST endpoint. Overridable for emulators.
    pub storage_endpoint: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auth_domain: String::new(),
            project_id: String::new(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            database_url: String::new(),
            space_id: String::new(),
            storage_endpoint: "https://firebasestorage.googleapis.com".to_string(),
        }
    }
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("database_url", &self.database_url)
            .field("space_id", &self.space_id)
            .field("storage_endpoint", &self.storage_endpoint)
            .finish_non_exhaustive()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Upload and retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum number of store attempts per upload (1..=10).
    pub max_retries: u32,

    /// Timeout for the binary store request in seconds (10..=300).
    pub timeout_secs: u64,

    /// Timeout for metadata writes in seconds.
    pub metadata_timeout_secs: u64,

    /// Payload ceiling in megabytes, checked before any network call.
    pub max_file_size_mb: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl UploadConfig {
    /// Payload ceiling in bytes.
    pub fn max_payload_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_secs: 60,
            metadata_timeout_secs: 10,
            max_file_size_mb: 40,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

/// Availability cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// How long a probe result stays fresh, in seconds.
    pub freshness_secs: u64,

    /// Timeout for a single reachability probe, in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            freshness_secs: 10,
            probe_timeout_secs: 5,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExportConfig {
    /// Preset used when none is given on the command line.
    pub default_preset: ExportPreset,

    /// Settings used by the `custom` preset.
    pub custom: CustomExportConfig,
}

/// Custom export settings (used when the preset is `custom`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomExportConfig {
    /// Enable Draco mesh compression.
    pub compression: bool,

    /// Draco compression level (0..=10).
    pub compression_level: u32,

    /// Maximum texture dimension in pixels (256..=8192).
    pub texture_limit: u32,

    /// JPEG compression quality (1..=100).
    pub image_quality: u32,

    pub export_animations: bool,
    pub apply_modifiers: bool,
}

impl Default for CustomExportConfig {
    fn default() -> Self {
        Self {
            compression: true,
            compression_level: 6,
            texture_limit: 2048,
            image_quality: 85,
            export_animations: true,
            apply_modifiers: true,
        }
    }
}

/// Upload history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record successful uploads.
    pub enabled: bool,

    /// History file location.
    pub path: String,

    /// Number of entries kept.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "banter-history.json".to_string(),
            limit: 20,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
