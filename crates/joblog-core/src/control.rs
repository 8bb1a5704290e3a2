//! Download control: one abort token per job with a running download batch.
//!
//! The batch runner checks its token between downloads. Leaving the log view
//! of a job requests abort; the download already in flight is allowed to
//! finish and its result is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared registry of job id -> abort token.
#[derive(Debug, Default)]
pub struct DownloadControl {
    batches: RwLock<HashMap<String, Arc<AtomicBool>>>,
}

impl DownloadControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch for `job_id`; returns the token to pass to the runner.
    /// A batch already registered for the job is asked to stop.
    pub fn register(&self, job_id: &str) -> Arc<AtomicBool> {
        let token = Arc::new(AtomicBool::new(false));
        let previous = self
            .batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.to_string(), Arc::clone(&token));
        if let Some(old) = previous {
            old.store(true, Ordering::Relaxed);
        }
        token
    }

    /// Unregister a finished batch. Only removes the entry if it still holds
    /// `token`, so a newer batch for the same job is left alone.
    pub fn unregister(&self, job_id: &str, token: &Arc<AtomicBool>) {
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        if batches.get(job_id).is_some_and(|t| Arc::ptr_eq(t, token)) {
            batches.remove(job_id);
        }
    }

    /// Ask the batch for `job_id` to stop at its next checkpoint.
    pub fn request_abort(&self, job_id: &str) {
        if let Some(token) = self
            .batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
        {
            tracing::debug!(job_id, "download abort requested");
            token.store(true, Ordering::Relaxed);
        }
    }

    /// Ask every registered batch to stop. Used on quit.
    pub fn abort_all(&self) {
        let batches = self.batches.read().unwrap_or_else(PoisonError::into_inner);
        for (job_id, token) in batches.iter() {
            tracing::debug!(job_id = %job_id, "download abort requested on shutdown");
            token.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self, job_id: &str) -> bool {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(job_id)
    }
}
