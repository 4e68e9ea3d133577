//! Sequential batch publishing.

use serde::Serialize;

use crate::upload::outcome::{UploadError, UploadOutcome};
use crate::upload::pipeline::{UploadRequest, Uploader};

/// A failed batch item.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub name: String,
    pub error: UploadError,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub successful: Vec<UploadOutcome>,
    pub failed: Vec<BatchFailure>,
    /// Items never attempted because the batch stopped early.
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            successful: self.successful.len(),
            failed: self.failed.len(),
            skipped: self.skipped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Uploader {
    /// Publish items one after another.
    ///
    /// With `skip_failed` a failing item is recorded and the batch goes on;
    /// otherwise the first failure stops the batch.
    pub async fn publish_batch<I>(&self, items: I, skip_failed: bool) -> BatchReport
    where
        I: IntoIterator<Item = UploadRequest>,
    {
        let mut items = items.into_iter();
        let mut report = BatchReport::default();

        while let Some(item) = items.next() {
            let name = item.name.clone();
            match self.publish(item).await {
                Ok(outcome) => report.successful.push(outcome),
                Err(error) => {
                    tracing::warn!(name = %name, error = %error, "Batch item failed");
                    report.failed.push(BatchFailure { name, error });
                    if !skip_failed {
                        report.skipped = items.by_ref().count();
                        break;
                    }
                }
            }
        }

        let summary = report.summary();
        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch finished"
        );
        report
    }
}
