//! Job source interface: the external tool that lists jobs, prints logs and
//! downloads outputs.
//!
//! The core only depends on this trait. Calls are blocking; async callers run
//! them inside `spawn_blocking`.

mod dx;

pub use dx::DxCli;

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, SourceError};

/// Parameters for one job listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    /// Number of most recent jobs to list.
    pub limit: usize,
    /// Restrict to one owner; `None` lists everyone's jobs.
    pub owner: Option<String>,
}

/// Trait implemented by job sources (the `dx` CLI, or fakes in tests).
pub trait JobSource: Send + Sync {
    /// Raw listing text, including output references. Empty text means the
    /// owner is unknown; it is not an error at this level.
    fn list_jobs(&self, query: &JobQuery) -> Result<String, SourceError>;

    /// Full log of a job, or of one attempt of it. Empty text for an attempt
    /// means the attempt does not exist.
    fn watch(&self, job_id: &str, attempt: Option<u32>) -> Result<String, SourceError>;

    /// Fetch one output reference into `dest_dir`, overwriting any local copy.
    fn download(&self, reference: &str, dest_dir: &Path) -> Result<(), SourceError>;
}

/// Log text for a job (or one attempt), fetched on the blocking pool and
/// trimmed for display.
pub async fn fetch_log(
    source: Arc<dyn JobSource>,
    job_id: String,
    attempt: Option<u32>,
) -> Result<String, Error> {
    let text = tokio::task::spawn_blocking(move || source.watch(&job_id, attempt)).await??;
    Ok(text.trim().to_string())
}
