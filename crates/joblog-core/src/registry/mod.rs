//! Job registry: the fetched job set plus the fetch/display window.
//!
//! The registry is the only owner of job records. Every fetch replaces the
//! whole set in one swap; readers take an `Arc` snapshot and never observe a
//! half-applied update. Fetches are serialised by `refresh_gate`, and a
//! refresh that queued behind a fetch which already produced the current
//! window is coalesced instead of hitting the source again.

mod window;

pub use window::Window;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Error;
use crate::job::{self, Job};
use crate::source::{JobQuery, JobSource};

/// Consistent view of the registry at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<Job>>,
    pub window: Window,
    /// Bumped on every successful fetch.
    pub generation: u64,
}

#[derive(Debug)]
struct RegistryState {
    records: Arc<Vec<Job>>,
    window: Window,
    generation: u64,
    /// `requested` used by the last successful fetch.
    fetched_with: Option<usize>,
}

impl RegistryState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: Arc::clone(&self.records),
            window: self.window,
            generation: self.generation,
        }
    }
}

pub struct JobRegistry {
    source: Arc<dyn JobSource>,
    owner: Option<String>,
    step: usize,
    state: RwLock<RegistryState>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl JobRegistry {
    /// Empty registry; nothing is fetched until the first `refresh`. The
    /// initial window is at least one step.
    pub fn new(
        source: Arc<dyn JobSource>,
        owner: Option<String>,
        initial_count: usize,
        step: usize,
    ) -> Self {
        let step = step.max(1);
        Self {
            source,
            owner: owner.filter(|o| !o.is_empty()),
            step,
            state: RwLock::new(RegistryState {
                records: Arc::new(Vec::new()),
                window: Window::new(initial_count.max(step)),
                generation: 0,
                fetched_with: None,
            }),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Configured grow/shrink step.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current_window(&self) -> Window {
        self.read().window
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }

    /// Re-fetch `requested` jobs and replace the record set.
    ///
    /// Waits for any in-flight fetch first. If that fetch already covered the
    /// current window, its result is returned without another source call.
    pub async fn refresh(&self) -> Result<Snapshot, Error> {
        let seen = self.read().generation;
        let _gate = self.refresh_gate.lock().await;
        {
            let state = self.read();
            if state.generation != seen && state.fetched_with == Some(state.window.requested()) {
                tracing::debug!(generation = state.generation, "refresh coalesced");
                return Ok(state.snapshot());
            }
        }

        let requested = self.current_window().requested();
        let jobs = self.fetch(requested).await?;
        Ok(self.commit(jobs, requested, None))
    }

    /// Show `step` more jobs, doubling the fetch size first when the current
    /// fetch cannot cover the larger window.
    pub async fn grow(&self, step: usize) -> Result<Snapshot, Error> {
        let _gate = self.refresh_gate.lock().await;
        let mut target = self.current_window();
        if target.needs_fetch_to_grow(step) {
            target.double_requested();
            tracing::info!(
                requested = target.requested(),
                "window grows past fetched jobs, re-fetching"
            );
            let jobs = self.fetch(target.requested()).await?;
            return Ok(self.commit(jobs, target.requested(), Some(step)));
        }

        let mut state = self.write();
        state.window.extend(step);
        tracing::debug!(visible = state.window.visible(), "window grown");
        Ok(state.snapshot())
    }

    /// Show `step` fewer jobs (never below one step). Never fetches.
    pub fn shrink(&self, step: usize) -> Snapshot {
        let mut state = self.write();
        state.window.shrink(step);
        tracing::debug!(visible = state.window.visible(), "window shrunk");
        state.snapshot()
    }

    async fn fetch(&self, requested: usize) -> Result<Vec<Job>, Error> {
        let query = JobQuery {
            limit: requested,
            owner: self.owner.clone(),
        };
        let source = Arc::clone(&self.source);
        tracing::debug!(requested, owner = ?query.owner, "fetching job listing");
        let jobs = tokio::task::spawn_blocking(move || -> Result<Vec<Job>, Error> {
            let raw = source.list_jobs(&query)?;
            Ok(job::parse(&raw)?)
        })
        .await??;
        tracing::info!(requested, fetched = jobs.len(), "job listing fetched");
        Ok(jobs)
    }

    fn commit(&self, jobs: Vec<Job>, requested: usize, extend_by: Option<usize>) -> Snapshot {
        let available = jobs.len();
        let mut state = self.write();
        state.window.set_requested(requested);
        if let Some(step) = extend_by {
            state.window.extend(step);
        }
        state.window.clamp_to_available(available, self.step);
        state.records = Arc::new(jobs);
        state.generation += 1;
        state.fetched_with = Some(requested);
        state.snapshot()
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("owner", &self.owner)
            .field("step", &self.step)
            .field("state", &*self.read())
            .finish_non_exhaustive()
    }
}
