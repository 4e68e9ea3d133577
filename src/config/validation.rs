//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (retries, timeouts, export settings)
//! - Check that the selected backend has the identifiers it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: UploaderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{BackendKind, UploaderConfig};

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "upload.max_retries").
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_range<T>(errors: &mut Vec<ValidationError>, field: &'static str, value: T, min: T, max: T)
where
    T: PartialOrd + fmt::Display + Copy,
{
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

fn check_required(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "is required for the selected backend"));
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &UploaderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let upload = &config.upload;
    check_range(&mut errors, "upload.max_retries", upload.max_retries, 1, 10);
    check_range(&mut errors, "upload.timeout_secs", upload.timeout_secs, 10, 300);
    if upload.metadata_timeout_secs == 0 {
        errors.push(ValidationError::new("upload.metadata_timeout_secs", "must be greater than 0"));
    }
    if upload.max_file_size_mb == 0 {
        errors.push(ValidationError::new("upload.max_file_size_mb", "must be greater than 0"));
    }
    if upload.base_delay_ms > upload.max_delay_ms {
        errors.push(ValidationError::new(
            "upload.base_delay_ms",
            format!(
                "must not exceed upload.max_delay_ms ({} > {})",
                upload.base_delay_ms, upload.max_delay_ms
            ),
        ));
    }

    if config.availability.freshness_secs == 0 {
        errors.push(ValidationError::new("availability.freshness_secs", "must be greater than 0"));
    }
    if config.availability.probe_timeout_secs == 0 {
        errors.push(ValidationError::new("availability.probe_timeout_secs", "must be greater than 0"));
    }

    let custom = &config.export.custom;
    check_range(&mut errors, "export.custom.compression_level", custom.compression_level, 0, 10);
    check_range(&mut errors, "export.custom.texture_limit", custom.texture_limit, 256, 8192);
    check_range(&mut errors, "export.custom.image_quality", custom.image_quality, 1, 100);

    if config.history.enabled {
        if config.history.path.trim().is_empty() {
            errors.push(ValidationError::new("history.path", "must not be empty when history is enabled"));
        }
        if config.history.limit == 0 {
            errors.push(ValidationError::new("history.limit", "must be greater than 0"));
        }
    }

    match config.backend {
        BackendKind::Microservice => {
            check_required(&mut errors, "microservice.server_url", &config.microservice.server_url);
            if !config.microservice.server_url.trim().is_empty() {
                check_url(&mut errors, "microservice.server_url", &config.microservice.server_url);
            }
        }
        BackendKind::Firebase => {
            let fb = &config.firebase;
            check_required(&mut errors, "firebase.storage_bucket", &fb.storage_bucket);
            check_required(&mut errors, "firebase.database_url", &fb.database_url);
            check_required(&mut errors, "firebase.space_id", &fb.space_id);
            if !fb.database_url.trim().is_empty() {
                check_url(&mut errors, "firebase.database_url", &fb.database_url);
            }
            check_url(&mut errors, "firebase.storage_endpoint", &fb.storage_endpoint);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
