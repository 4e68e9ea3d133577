//! Upload history and persistence.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::HistoryConfig;
use crate::export::ExportPreset;
use crate::upload::UploadOutcome;

/// One successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    pub size_mb: f64,
    pub preset: ExportPreset,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl HistoryEntry {
    pub fn from_outcome(outcome: &UploadOutcome, preset: ExportPreset) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            name: outcome.name.clone(),
            location: outcome.location.clone(),
            component_id: outcome.component_id.as_ref().map(|id| id.to_string()),
            size_mb: outcome.size_bytes as f64 / (1024.0 * 1024.0),
            preset,
            timestamp,
        }
    }
}

/// Most recent uploads, newest first, capped at `limit`.
#[derive(Debug, Clone)]
pub struct UploadHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
    path: Option<PathBuf>,
}

impl UploadHistory {
    /// In-memory history.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
            path: None,
        }
    }

    /// Load from `path` if it exists; later saves go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>, limit: usize) -> std::io::Result<Self> {
        let path = path.as_ref();
        let mut history = Self::new(limit);
        history.path = Some(path.to_path_buf());

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let entries: Vec<HistoryEntry> = serde_json::from_reader(reader)?;
            history.entries = entries.into_iter().take(history.limit).collect();
            tracing::debug!(entries = history.entries.len(), path = %path.display(), "Loaded upload history");
        }
        Ok(history)
    }

    pub fn from_config(config: &HistoryConfig) -> std::io::Result<Self> {
        Self::load_from_file(&config.path, config.limit)
    }

    /// Save to the backing file, if any.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.path {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &self.entries)?;
            tracing::debug!(entries = self.entries.len(), path = %path.display(), "Saved upload history");
        }
        Ok(())
    }

    /// Add an entry at the front, dropping the oldest beyond the limit.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
