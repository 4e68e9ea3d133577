//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! banter-uploader.toml
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → UploaderConfig (validated, immutable)
//!     → handed to backend construction, uploader, cache, history
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credentials can come from the environment instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AvailabilityConfig, BackendKind, CustomExportConfig, ExportConfig, FirebaseConfig,
    HistoryConfig, MicroserviceConfig, ObservabilityConfig, UploadConfig, UploaderConfig,
};
