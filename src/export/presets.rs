//! Export presets and the glTF exporter settings they resolve to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::CustomExportConfig;

/// Named export preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreset {
    /// Aggressive compression for standalone headsets.
    #[default]
    MobileVr,
    /// Balanced settings for tethered headsets.
    PcVr,
    /// No mesh compression, large textures.
    HighQuality,
    /// Values from `[export.custom]`.
    Custom,
}

impl ExportPreset {
    pub const ALL: [ExportPreset; 4] = [
        ExportPreset::MobileVr,
        ExportPreset::PcVr,
        ExportPreset::HighQuality,
        ExportPreset::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPreset::MobileVr => "mobile_vr",
            ExportPreset::PcVr => "pc_vr",
            ExportPreset::HighQuality => "high_quality",
            ExportPreset::Custom => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExportPreset::MobileVr => "Optimized for Quest and mobile VR",
            ExportPreset::PcVr => "Balanced quality for PC VR",
            ExportPreset::HighQuality => "Maximum quality, larger files",
            ExportPreset::Custom => "User-defined export settings",
        }
    }
}

impl fmt::Display for ExportPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown preset '{0}' (expected mobile_vr, pc_vr, high_quality or custom)")]
pub struct ParsePresetError(String);

impl FromStr for ExportPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ExportPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

/// Full exporter parameter set for one preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSettings {
    pub preset: ExportPreset,
    pub format: &'static str,
    pub image_format: &'static str,
    pub texcoords: bool,
    pub normals: bool,
    pub materials: &'static str,
    pub colors: bool,
    pub cameras: bool,
    pub lights: bool,
    pub animations: bool,
    pub frame_range: bool,
    pub apply_modifiers: bool,
    /// Draco level when mesh compression is enabled.
    pub draco_level: Option<u32>,
    pub image_quality: u32,
    pub texture_size_limit: u32,
}

impl ExportSettings {
    fn base(preset: ExportPreset) -> Self {
        Self {
            preset,
            format: "GLB",
            image_format: "AUTO",
            texcoords: true,
            normals: true,
            materials: "EXPORT",
            colors: true,
            cameras: false,
            lights: false,
            animations: true,
            frame_range: false,
            apply_modifiers: true,
            draco_level: None,
            image_quality: 85,
            texture_size_limit: 2048,
        }
    }

    /// Resolve a preset; `custom` reads from `custom`.
    pub fn resolve(preset: ExportPreset, custom: &CustomExportConfig) -> Self {
        let base = Self::base(preset);
        match preset {
            ExportPreset::MobileVr => Self {
                draco_level: Some(6),
                image_quality: 75,
                texture_size_limit: 1024,
                ..base
            },
            ExportPreset::PcVr => Self {
                draco_level: Some(4),
                image_quality: 85,
                texture_size_limit: 2048,
                ..base
            },
            ExportPreset::HighQuality => Self {
                draco_level: None,
                image_quality: 95,
                texture_size_limit: 4096,
                ..base
            },
            ExportPreset::Custom => Self {
                draco_level: custom.compression.then_some(custom.compression_level),
                image_quality: custom.image_quality,
                texture_size_limit: custom.texture_limit,
                animations: custom.export_animations,
                apply_modifiers: custom.apply_modifiers,
                ..base
            },
        }
    }

    pub fn compression_enabled(&self) -> bool {
        self.draco_level.is_some()
    }

    /// Keyword arguments for the host's glTF exporter.
    pub fn exporter_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("export_format".into(), json!(self.format));
        params.insert("export_image_format".into(), json!(self.image_format));
        params.insert("export_texcoords".into(), json!(self.texcoords));
        params.insert("export_normals".into(), json!(self.normals));
        params.insert("export_materials".into(), json!(self.materials));
        params.insert("export_colors".into(), json!(self.colors));
        params.insert("export_cameras".into(), json!(self.cameras));
        params.insert("export_lights".into(), json!(self.lights));
        params.insert("export_animations".into(), json!(self.animations));
        params.insert("export_frame_range".into(), json!(self.frame_range));
        params.insert("export_apply".into(), json!(self.apply_modifiers));
        params.insert("export_image_quality".into(), json!(self.image_quality));
        params.insert("export_image_size".into(), json!(self.texture_size_limit));
        params.insert(
            "export_draco_mesh_compression_enable".into(),
            json!(self.compression_enabled()),
        );

        if let Some(level) = self.draco_level {
            params.insert("export_draco_mesh_compression_level".into(), json!(level));
            params.insert("export_draco_position_quantization".into(), json!(14));
            params.insert("export_draco_normal_quantization".into(), json!(10));
            params.insert("export_draco_texcoord_quantization".into(), json!(12));
            params.insert("export_draco_color_quantization".into(), json!(10));
            params.insert("export_draco_generic_quantization".into(), json!(12));
        }
        params
    }
}
