//! In-memory job source that synthesises `dx find jobs` listings and counts
//! every call.
//!
//! Job `i` is `job-{i:04}`; statuses cycle done, running, failed. Done jobs
//! carry two outputs. A listing shorter than the platform's total ends with a
//! "More results" trailer, as `dx` prints it.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};

use joblog_core::source::{JobQuery, JobSource};
use joblog_core::SourceError;

pub struct ScriptedSource {
    total: usize,
    tries: u32,
    invalid_user: bool,
    fail_listing: AtomicBool,
    list_calls: AtomicUsize,
    watch_calls: AtomicUsize,
    queries: Mutex<Vec<JobQuery>>,
    downloads: Mutex<Vec<String>>,
    hold: Mutex<Option<(mpsc::Receiver<()>, tokio::sync::oneshot::Sender<()>)>>,
}

impl ScriptedSource {
    /// A platform holding `total` jobs, each with a single attempt.
    pub fn with_jobs(total: usize) -> Self {
        Self {
            total,
            tries: 1,
            invalid_user: false,
            fail_listing: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            watch_calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            hold: Mutex::new(None),
        }
    }

    /// Every job was retried until it had `tries` attempts.
    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// `dx` prints nothing, as it does for an unknown `--user`.
    pub fn invalid_user() -> Self {
        Self {
            invalid_user: true,
            ..Self::with_jobs(0)
        }
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Block the next listing call until `release` fires. `entered` fires
    /// once the call is in progress.
    pub fn hold_next_listing(&self) -> (mpsc::Sender<()>, tokio::sync::oneshot::Receiver<()>) {
        let (release, wait) = mpsc::channel();
        let (entered_tx, entered) = tokio::sync::oneshot::channel();
        *self.hold.lock().unwrap() = Some((wait, entered_tx));
        (release, entered)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<JobQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

pub fn job_id(i: usize) -> String {
    format!("job-{i:04}")
}

/// Listing of the first `count` of `total` jobs.
pub fn listing(count: usize, total: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        let owner = if i % 2 == 0 { "user-alice" } else { "user-bob" };
        let day = i % 28 + 1;
        match i % 3 {
            0 => {
                let _ = write!(
                    out,
                    "* Job {i} (app:main) (done) {id}\n  {owner} 2024-03-{day:02} 10:00:00 (runtime 0:01:00)\n  Output: out = [ file-{i}a, file-{i}b ]\n",
                    id = job_id(i)
                );
            }
            1 => {
                let _ = write!(
                    out,
                    "* Job {i} (app:main) (running) {id}\n  {owner} 2024-03-{day:02} 10:00:00\n",
                    id = job_id(i)
                );
            }
            _ => {
                let _ = write!(
                    out,
                    "* Job {i} (app:main) (failed) {id}\n  {owner} 2024-03-{day:02} 10:00:00 (runtime 0:00:10)\n",
                    id = job_id(i)
                );
            }
        }
    }
    if count < total {
        out.push_str("* More results not shown; use -n to increase number of results\n");
    }
    out
}

impl JobSource for ScriptedSource {
    fn list_jobs(&self, query: &JobQuery) -> Result<String, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        let hold = self.hold.lock().unwrap().take();
        if let Some((wait, entered)) = hold {
            let _ = entered.send(());
            let _ = wait.recv();
        }
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(SourceError::Spawn {
                program: "dx".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "dx not installed"),
            });
        }
        if self.invalid_user {
            return Ok(String::new());
        }
        Ok(listing(query.limit.min(self.total), self.total))
    }

    fn watch(&self, job_id: &str, attempt: Option<u32>) -> Result<String, SourceError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        match attempt {
            None => Ok(format!("log of {job_id}\nline 2\n")),
            Some(n) if n < self.tries => Ok(format!("log of {job_id} try {n}\n")),
            Some(_) => Ok(String::new()),
        }
    }

    fn download(&self, reference: &str, dest_dir: &Path) -> Result<(), SourceError> {
        self.downloads.lock().unwrap().push(reference.to_string());
        std::fs::write(dest_dir.join(reference), reference).map_err(|source| {
            SourceError::Spawn {
                program: "dx".to_string(),
                source,
            }
        })
    }
}
