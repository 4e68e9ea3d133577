//! Pre-upload checks of an exported asset against a preset.

use serde::Serialize;

use crate::export::glb::GlbSummary;
use crate::export::presets::{ExportPreset, ExportSettings};

const MIB: f64 = 1024.0 * 1024.0;

/// Limits the checks compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationThresholds {
    pub max_polygons_mobile: u64,
    pub max_polygons_pc: u64,
    pub warn_texture_size: u32,
    pub max_file_size_mb: u64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            max_polygons_mobile: 100_000,
            max_polygons_pc: 500_000,
            warn_texture_size: 2048,
            max_file_size_mb: 40,
        }
    }
}

impl ValidationThresholds {
    /// Defaults with the file size ceiling taken from configuration.
    pub fn with_max_file_size(max_file_size_mb: u64) -> Self {
        Self {
            max_file_size_mb,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Rough exported size: 12 bytes per vertex and polygon, 1 MiB per
/// material, plus 20% container overhead.
pub fn estimate_file_size(summary: &GlbSummary) -> u64 {
    let raw = summary
        .vertex_count
        .saturating_mul(12)
        .saturating_add(summary.polygon_count.saturating_mul(12))
        .saturating_add((summary.material_count as u64).saturating_mul(1024 * 1024));
    (raw as f64 * 1.2) as u64
}

fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Check a summary against the preset's limits.
pub fn validate_for_preset(
    summary: &GlbSummary,
    settings: &ExportSettings,
    thresholds: &ValidationThresholds,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if summary.mesh_count == 0 {
        report.errors.push("Asset contains no meshes".to_string());
    }

    let polys = summary.polygon_count;
    if polys > thresholds.max_polygons_pc {
        report.warnings.push(format!(
            "High polygon count ({}) may impact performance",
            with_thousands(polys)
        ));
    } else if polys > thresholds.max_polygons_mobile && settings.preset == ExportPreset::MobileVr {
        report.warnings.push(format!(
            "Polygon count ({}) exceeds mobile VR recommendation",
            with_thousands(polys)
        ));
    }

    let missing = summary.missing_textures();
    if !missing.is_empty() {
        report
            .warnings
            .push(format!("Missing textures: {}", missing.join(", ")));
    }

    let size_mb = estimate_file_size(summary) as f64 / MIB;
    let max_mb = thresholds.max_file_size_mb as f64;
    if size_mb > max_mb {
        report.errors.push(format!(
            "Estimated file size ({:.1}MB) exceeds maximum ({}MB)",
            size_mb, thresholds.max_file_size_mb
        ));
    } else if size_mb > max_mb * 0.8 {
        report
            .warnings
            .push(format!("File size ({:.1}MB) approaching maximum limit", size_mb));
    }

    let limit = settings.texture_size_limit;
    for image in &summary.images {
        let (Some(width), Some(height)) = (image.width, image.height) else {
            continue;
        };
        if width.max(height) > limit {
            report.warnings.push(format!(
                "Texture '{}' ({}x{}) exceeds preset limit ({}x{})",
                image.name, width, height, limit, limit
            ));
        } else if width.max(height) > thresholds.warn_texture_size {
            report.warnings.push(format!(
                "Texture '{}' ({}x{}) is larger than {}px",
                image.name, width, height, thresholds.warn_texture_size
            ));
        }
    }

    report
}
