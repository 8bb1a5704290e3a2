//! Output download batches.
//!
//! Downloads run one reference at a time. A failed download is recorded and
//! the batch moves on; the report at the end carries every failure. The abort
//! token is checked before each download and again after it completes, so an
//! abort never interrupts a transfer but does drop its result.

mod progress;

pub use progress::BatchProgress;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;
use crate::source::JobSource;

/// One output reference that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub reference: String,
    pub message: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<DownloadFailure>,
    /// True when the batch stopped early on request.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// One-line summary for the status line.
    pub fn summary(&self) -> String {
        let mut s = format!("downloaded {}/{} outputs", self.succeeded, self.total);
        if !self.failures.is_empty() {
            s.push_str(&format!(" ({} failed)", self.failures.len()));
        }
        if self.cancelled {
            s.push_str(", cancelled");
        }
        s
    }
}

/// Download every reference in `outputs` into `dest_dir`, in order.
///
/// `on_progress` is called after each download that counts (not for a result
/// discarded because of an abort).
pub fn run_batch(
    source: &dyn JobSource,
    job_id: &str,
    outputs: &[String],
    dest_dir: &Path,
    abort: &AtomicBool,
    mut on_progress: impl FnMut(BatchProgress),
) -> BatchReport {
    let mut report = BatchReport {
        total: outputs.len(),
        ..BatchReport::default()
    };
    let mut progress = BatchProgress::new(outputs.len());

    for reference in outputs {
        if abort.load(Ordering::Relaxed) {
            report.cancelled = true;
            break;
        }
        let result = source.download(reference, dest_dir);
        if abort.load(Ordering::Relaxed) {
            tracing::debug!(job_id, output = %reference, "discarding download finished after abort");
            report.cancelled = true;
            break;
        }
        match result {
            Ok(()) => {
                tracing::debug!(job_id, output = %reference, "output downloaded");
                report.succeeded += 1;
                progress.advance(true);
            }
            Err(e) => {
                tracing::warn!(job_id, output = %reference, "download failed: {}", e);
                report.failures.push(DownloadFailure {
                    reference: reference.clone(),
                    message: e.to_string(),
                });
                progress.advance(false);
            }
        }
        on_progress(progress);
    }

    tracing::info!(
        job_id,
        succeeded = report.succeeded,
        failed = report.failed(),
        cancelled = report.cancelled,
        "download batch finished"
    );
    report
}

/// `run_batch` on the blocking pool.
pub async fn spawn_batch(
    source: Arc<dyn JobSource>,
    job_id: String,
    outputs: Vec<String>,
    dest_dir: PathBuf,
    abort: Arc<AtomicBool>,
    on_progress: impl FnMut(BatchProgress) + Send + 'static,
) -> Result<BatchReport, Error> {
    let report = tokio::task::spawn_blocking(move || {
        run_batch(
            source.as_ref(),
            &job_id,
            &outputs,
            &dest_dir,
            &abort,
            on_progress,
        )
    })
    .await?;
    Ok(report)
}
