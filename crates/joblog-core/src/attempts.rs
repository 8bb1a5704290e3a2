//! Attempt (retry) discovery for one job.
//!
//! The platform has no "list attempts" call; attempts are found by asking for
//! the log of try 0, 1, 2, ... until the tool prints nothing.

use std::sync::Arc;

use crate::error::{Error, SourceError};
use crate::source::JobSource;

/// One execution attempt of a job, with the log it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Zero-based try number, as passed to `dx watch --try`.
    pub index: u32,
    pub log: String,
    /// The last attempt found; the one whose result the job reports.
    pub is_final: bool,
}

impl Attempt {
    pub fn label(&self) -> String {
        format!("Attempt {}", self.index + 1)
    }
}

/// Probe attempts `0..max_attempts`, stopping at the first empty log.
pub fn discover_blocking(
    source: &dyn JobSource,
    job_id: &str,
    max_attempts: u32,
) -> Result<Vec<Attempt>, SourceError> {
    let mut attempts = Vec::new();
    for index in 0..max_attempts {
        let log = source.watch(job_id, Some(index))?;
        let log = log.trim();
        if log.is_empty() {
            break;
        }
        attempts.push(Attempt {
            index,
            log: log.to_string(),
            is_final: false,
        });
    }
    if let Some(last) = attempts.last_mut() {
        last.is_final = true;
    }
    tracing::debug!(job_id, found = attempts.len(), "attempts discovered");
    Ok(attempts)
}

/// `discover_blocking` on the blocking pool.
pub async fn discover(
    source: Arc<dyn JobSource>,
    job_id: String,
    max_attempts: u32,
) -> Result<Vec<Attempt>, Error> {
    let attempts = tokio::task::spawn_blocking(move || {
        discover_blocking(source.as_ref(), &job_id, max_attempts)
    })
    .await??;
    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::JobQuery;
    use std::path::Path;

    struct TriesSource {
        tries: Vec<&'static str>,
    }

    impl JobSource for TriesSource {
        fn list_jobs(&self, _query: &JobQuery) -> Result<String, SourceError> {
            Ok(String::new())
        }

        fn watch(&self, _job_id: &str, attempt: Option<u32>) -> Result<String, SourceError> {
            let n = attempt.unwrap_or(0) as usize;
            Ok(self.tries.get(n).copied().unwrap_or("").to_string())
        }

        fn download(&self, _reference: &str, _dest_dir: &Path) -> Result<(), SourceError> {
            Ok(())
        }
    }

    #[test]
    fn stops_at_first_empty_log() {
        let src = TriesSource {
            tries: vec!["first try\n", "second try\n", "", "unreachable"],
        };
        let attempts = discover_blocking(&src, "job-1", 16).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].log, "first try");
        assert!(!attempts[0].is_final);
        assert!(attempts[1].is_final);
        assert_eq!(attempts[1].label(), "Attempt 2");
    }

    #[test]
    fn respects_max_attempts() {
        let src = TriesSource {
            tries: vec!["a", "b", "c", "d"],
        };
        let attempts = discover_blocking(&src, "job-1", 3).unwrap();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[2].index, 2);
    }

    #[test]
    fn no_attempts_when_first_log_is_empty() {
        let src = TriesSource { tries: vec![] };
        assert!(discover_blocking(&src, "job-1", 4).unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_discover_runs_on_blocking_pool() {
        let src: Arc<dyn JobSource> = Arc::new(TriesSource { tries: vec!["x"] });
        let attempts = discover(src, "job-9".to_string(), 4).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].is_final);
    }
}
