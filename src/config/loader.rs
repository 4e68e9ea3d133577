//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::UploaderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variables that override credentials and identifiers.
const ENV_OVERRIDES: &[&str] = &[
    "BANTER_SERVER_URL",
    "BANTER_USERNAME",
    "BANTER_SECRET",
    "BANTER_FIREBASE_API_KEY",
    "BANTER_SPACE_ID",
];

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<UploaderConfig, ConfigError> {
    let mut config: UploaderConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<UploaderConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), backend = %config.backend, "Configuration loaded");
    Ok(config)
}

/// Load the file if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<UploaderConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file, using defaults");
    let mut config = UploaderConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply credential overrides. Secrets never have to live in the config file.
pub fn apply_env_overrides<F>(config: &mut UploaderConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for key in ENV_OVERRIDES {
        let Some(value) = lookup(key).filter(|v| !v.is_empty()) else {
            continue;
        };
        match *key {
            "BANTER_SERVER_URL" => config.microservice.server_url = value,
            "BANTER_USERNAME" => config.microservice.username = value,
            "BANTER_SECRET" => config.microservice.secret = value,
            "BANTER_FIREBASE_API_KEY" => config.firebase.api_key = value,
            "BANTER_SPACE_ID" => config.firebase.space_id = value,
            _ => continue,
        }
        tracing::debug!(variable = key, "Applied environment override");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendKind;
    use crate::export::ExportPreset;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            backend = "firebase"

            [firebase]
            storage_bucket = "demo.appspot.com"
            database_url = "https://demo-default-rtdb.firebaseio.com/"
            space_id = "lobby"
            project_id = "demo"

            [upload]
            max_retries = 5

            [export]
            default_preset = "pc_vr"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Firebase);
        assert_eq!(config.upload.max_retries, 5);
        assert_eq!(config.upload.timeout_secs, 60);
        assert_eq!(config.export.default_preset, ExportPreset::PcVr);
        assert_eq!(config.availability.freshness_secs, 10);
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_config("[upload]\nmax_retries = 11\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("upload.max_retries"));
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        let err = parse_config("backend = \"ftp\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = UploaderConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "BANTER_SECRET" => Some("s3cret".to_string()),
            "BANTER_SPACE_ID" => Some("space-42".to_string()),
            "BANTER_USERNAME" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.microservice.secret, "s3cret");
        assert_eq!(config.firebase.space_id, "space-42");
        assert!(config.microservice.username.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banter-uploader.toml");
        std::fs::write(&path, "[microservice]\nserver_url = \"http://127.0.0.1:9000\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.microservice.server_url, "http://127.0.0.1:9000");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_config(&missing), Err(ConfigError::Io(_))));
    }
}
