//! Job records decoded from one `dx find jobs` listing.
//!
//! A listing is parsed in one go into an ordered `Vec<Job>`; records are
//! immutable and the whole collection is replaced on every fetch.

mod parse;

pub use parse::{parse, DATE_DISPLAY_FORMAT, DATE_INPUT_FORMAT};

use std::fmt;

/// Execution state reported by the platform.
///
/// Unknown tokens are kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Done,
    Failed,
    Running,
    Waiting,
    Other(String),
}

impl JobStatus {
    pub fn from_token(token: &str) -> Self {
        match token {
            "done" => JobStatus::Done,
            "failed" => JobStatus::Failed,
            "running" => JobStatus::Running,
            t if t.starts_with("waiting") => JobStatus::Waiting,
            t => JobStatus::Other(t.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Running => "running",
            JobStatus::Waiting => "waiting",
            JobStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock runtime of a finished job; unset while it has not finished.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Runtime {
    #[default]
    Unset,
    Elapsed(String),
}

impl Runtime {
    pub fn is_unset(&self) -> bool {
        matches!(self, Runtime::Unset)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Unset => f.write_str("-"),
            Runtime::Elapsed(s) => f.write_str(s),
        }
    }
}

/// One remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Platform job id (`job-...`), unique within one listing.
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub owner: String,
    /// Submission date, already in display form (`dd/mm/yy`).
    pub submitted: String,
    pub runtime: Runtime,
    /// Output references (`file-...`). Only ever non-empty for `Done` jobs.
    pub outputs: Vec<String>,
}

impl Job {
    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}
