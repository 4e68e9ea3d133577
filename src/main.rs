//! banter-uploader
//!
//! Publishes exported GLB assets to a Banter space.
//!
//! # Architecture Overview
//!
//! ```text
//!   model.glb ──▶ export::glb::inspect ──▶ export::validation (preset limits)
//!                                                │
//!                                                ▼
//!   UploaderConfig ──▶ backend::from_config ──▶ UploadSession
//!                                                │  availability preflight (cached)
//!                                                ▼
//!                                           Uploader::publish
//!                                              store (retry + backoff)
//!                                              component record
//!                                              entity record
//!                                                │
//!                                                ▼
//!                                           history (last N uploads)
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use clap::{Parser, Subcommand};

use banter_uploader::availability::AvailabilityCache;
use banter_uploader::backend::{self, FirebaseBackend};
use banter_uploader::config::{self, BackendKind, UploaderConfig};
use banter_uploader::export::{
    self, ExportPreset, ExportSettings, ValidationReport, ValidationThresholds,
};
use banter_uploader::history::{HistoryEntry, UploadHistory};
use banter_uploader::observability::logging;
use banter_uploader::upload::{Placement, Quat, UploadRequest, UploadSession, Uploader, Vec3};

const DEFAULT_CONFIG: &str = "banter-uploader.toml";

#[derive(Parser)]
#[command(name = "banter-uploader")]
#[command(about = "Publish GLB assets to a Banter space", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults apply when the default file is absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and upload one GLB file
    Upload {
        file: PathBuf,
        /// Asset name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        preset: Option<ExportPreset>,
        /// Position as x,y,z
        #[arg(long, allow_hyphen_values = true)]
        position: Option<Vec3>,
        /// Rotation quaternion as x,y,z,w
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<Quat>,
        /// Scale as x,y,z
        #[arg(long, allow_hyphen_values = true)]
        scale: Option<Vec3>,
        /// Upload even when validation reports errors
        #[arg(long)]
        skip_validation: bool,
    },
    /// Upload several GLB files, one after another
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        preset: Option<ExportPreset>,
        /// Continue past failed items
        #[arg(long)]
        skip_failed: bool,
    },
    /// Show backend availability
    Status {
        /// Ignore the cached result and probe now
        #[arg(long)]
        refresh: bool,
        /// Keep polling every N seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Check a GLB file against a preset without uploading
    Validate {
        file: PathBuf,
        #[arg(short, long)]
        preset: Option<ExportPreset>,
    },
    /// List export presets and their exporter settings
    Presets {
        /// Print exporter parameters as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent uploads
    History {
        #[arg(long)]
        clear: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<UploaderConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => config::load_or_default(Path::new(DEFAULT_CONFIG)),
    }
}

fn build_session(config: &UploaderConfig) -> Result<UploadSession, Box<dyn std::error::Error>> {
    let backend = backend::from_config(config)?;
    let uploader = Uploader::from_config(backend, &config.upload).with_progress(|stage| {
        eprintln!("  {}", stage);
    });
    let cache = AvailabilityCache::new(Duration::from_secs(config.availability.freshness_secs));
    Ok(UploadSession::new(uploader, cache))
}

fn asset_name(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}

fn validate_file(
    config: &UploaderConfig,
    file: &Path,
    bytes: &[u8],
    preset: ExportPreset,
) -> Result<ValidationReport, export::GlbError> {
    let summary = export::inspect(bytes, file.parent())?;
    let settings = ExportSettings::resolve(preset, &config.export.custom);
    let thresholds = ValidationThresholds::with_max_file_size(config.upload.max_file_size_mb);

    tracing::debug!(
        meshes = summary.mesh_count,
        vertices = summary.vertex_count,
        polygons = summary.polygon_count,
        "Inspected GLB"
    );
    Ok(export::validate_for_preset(&summary, &settings, &thresholds))
}

fn print_report(file: &Path, report: &ValidationReport) {
    for warning in &report.warnings {
        eprintln!("warning: {}: {}", file.display(), warning);
    }
    for error in &report.errors {
        eprintln!("error: {}: {}", file.display(), error);
    }
}

fn record_history(config: &UploaderConfig, entries: Vec<HistoryEntry>) {
    if !config.history.enabled || entries.is_empty() {
        return;
    }
    let result = UploadHistory::from_config(&config.history).and_then(|mut history| {
        for entry in entries {
            history.record(entry);
        }
        history.save_to_file()
    });
    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to update upload history");
    }
}

async fn print_status(session: &UploadSession, refresh: bool) {
    let reachable = if refresh {
        session.refresh().await
    } else {
        session.status().await
    };
    let age = session
        .last_status()
        .map(|s| s.age().as_secs())
        .unwrap_or_default();
    println!(
        "{} ({}): {} (checked {}s ago)",
        session.backend().identity(),
        session.backend().kind(),
        if reachable { "reachable" } else { "unreachable" },
        age
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::debug!(backend = %config.backend, "banter-uploader starting");

    match cli.command {
        Commands::Upload {
            file,
            name,
            preset,
            position,
            rotation,
            scale,
            skip_validation,
        } => {
            let preset = preset.unwrap_or(config.export.default_preset);
            let bytes = tokio::fs::read(&file).await?;

            let report = validate_file(&config, &file, &bytes, preset)?;
            print_report(&file, &report);
            if !report.is_valid() && !skip_validation {
                return Err(format!("{}: validation failed", file.display()).into());
            }

            let defaults = Placement::default();
            let placement = Placement {
                position: position.unwrap_or(defaults.position),
                rotation: rotation.unwrap_or(defaults.rotation),
                scale: scale.unwrap_or(defaults.scale),
            };
            let request = UploadRequest::new(name.unwrap_or_else(|| asset_name(&file)), bytes)
                .with_placement(placement);

            let session = build_session(&config)?;
            let outcome = session.publish(request).await?;

            println!("Uploaded {} -> {}", outcome.name, outcome.location);
            if let Some(id) = &outcome.component_id {
                println!("Component: {}", id);
            }
            record_history(&config, vec![HistoryEntry::from_outcome(&outcome, preset)]);
        }

        Commands::Batch {
            files,
            preset,
            skip_failed,
        } => {
            let preset = preset.unwrap_or(config.export.default_preset);
            let mut requests = Vec::with_capacity(files.len());
            for file in &files {
                let bytes = tokio::fs::read(file).await?;
                let report = validate_file(&config, file, &bytes, preset)?;
                print_report(file, &report);
                if !report.is_valid() {
                    if skip_failed {
                        continue;
                    }
                    return Err(format!("{}: validation failed", file.display()).into());
                }
                requests.push(UploadRequest::new(asset_name(file), Bytes::from(bytes)));
            }

            let session = build_session(&config)?;
            let report = session.publish_batch(requests, skip_failed).await?;

            for outcome in &report.successful {
                println!("Uploaded {} -> {}", outcome.name, outcome.location);
            }
            for failure in &report.failed {
                eprintln!("Failed {}: {}", failure.name, failure.error);
            }
            let summary = report.summary();
            println!(
                "{} uploaded, {} failed, {} skipped",
                summary.successful, summary.failed, summary.skipped
            );

            let entries = report
                .successful
                .iter()
                .map(|outcome| HistoryEntry::from_outcome(outcome, preset))
                .collect();
            record_history(&config, entries);

            if !report.is_complete_success() {
                return Err("batch finished with failures".into());
            }
        }

        Commands::Status { refresh, watch } => {
            let session = build_session(&config)?;
            print_status(&session, refresh).await;

            if refresh && config.backend == BackendKind::Firebase {
                let firebase =
                    FirebaseBackend::new(&config.firebase, &config.upload, &config.availability)?;
                let report = firebase.test_connection().await;
                println!("{}", report.message);
            }

            if let Some(secs) = watch {
                let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
                interval.tick().await;
                loop {
                    tokio::select! {
                        _ = interval.tick() => print_status(&session, false).await,
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
            }
        }

        Commands::Validate { file, preset } => {
            let preset = preset.unwrap_or(config.export.default_preset);
            let bytes = tokio::fs::read(&file).await?;
            let report = validate_file(&config, &file, &bytes, preset)?;
            print_report(&file, &report);
            if !report.is_valid() {
                return Err(format!("{}: validation failed", file.display()).into());
            }
            println!(
                "{}: OK for {} ({} warning(s))",
                file.display(),
                preset,
                report.warnings.len()
            );
        }

        Commands::Presets { json } => {
            for preset in ExportPreset::ALL {
                let settings = ExportSettings::resolve(preset, &config.export.custom);
                if json {
                    println!(
                        "{}: {}",
                        preset,
                        serde_json::to_string_pretty(&settings.exporter_params())?
                    );
                    continue;
                }
                let marker = if preset == config.export.default_preset { "*" } else { " " };
                println!(
                    "{} {:<13} {:<36} draco={:<5} quality={:<3} textures={}",
                    marker,
                    preset.as_str(),
                    preset.description(),
                    settings
                        .draco_level
                        .map_or_else(|| "off".to_string(), |l| l.to_string()),
                    settings.image_quality,
                    settings.texture_size_limit
                );
            }
        }

        Commands::History { clear } => {
            let mut history = UploadHistory::from_config(&config.history)?;
            if clear {
                history.clear();
                history.save_to_file()?;
                println!("History cleared");
                return Ok(());
            }
            if history.is_empty() {
                println!("No uploads recorded");
            }
            for entry in history.entries() {
                println!(
                    "{}  {:<24} {:>7.2} MB  {:<12} {}",
                    entry.timestamp,
                    entry.name,
                    entry.size_mb,
                    entry.preset.as_str(),
                    entry.location
                );
            }
        }
    }

    Ok(())
}

