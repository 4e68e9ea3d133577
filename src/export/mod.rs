//! Export presets and pre-upload validation.
//!
//! # Data Flow
//! ```text
//! ExportPreset (CLI flag or [export] default_preset)
//!     → presets.rs: ExportSettings (exporter parameters for the host)
//!
//! exported .glb bytes
//!     → glb.rs: container checks, GlbSummary
//!     → validation.rs: warnings/errors for the chosen preset
//! ```

pub mod glb;
pub mod presets;
pub mod validation;

pub use glb::{inspect, inspect_file, GlbError, GlbSummary, ImageInfo};
pub use presets::{ExportPreset, ExportSettings, ParsePresetError};
pub use validation::{estimate_file_size, validate_for_preset, ValidationReport, ValidationThresholds};
