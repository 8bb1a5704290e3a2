//! Dashboard controller: applies operator actions and background results to
//! the view state, and tells the caller what to run next.
//!
//! Nothing here blocks. Work against the platform is requested by returning
//! an [`Effect`]; the binary runs it off the control thread and feeds the
//! result back as a [`Completion`]. Every call returns an [`Outcome`] saying
//! whether the screen needs redrawing.

use std::sync::Arc;

use crate::attempts::Attempt;
use crate::download::{BatchProgress, BatchReport};
use crate::error::Error;
use crate::filter::{self, ViewFilter};
use crate::job::{Job, JobStatus};
use crate::nav::{self, Action, DownloadState, LogView, Navigator, Screen, TrialsView};
use crate::registry::{JobRegistry, Snapshot, Window};

/// Work the caller must run off the control thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Refresh,
    Grow(usize),
    LoadLog {
        job_id: String,
        attempt: Option<u32>,
    },
    LoadAttempts {
        job_id: String,
    },
    Download {
        job_id: String,
        /// Echoed back in the batch's completions.
        batch: u64,
        outputs: Vec<String>,
    },
    CancelDownload {
        job_id: String,
    },
    Quit,
    /// Unrecoverable condition; leave with this message and a failure status.
    Exit(String),
}

/// Result of background work, fed back through [`Dashboard::apply`].
#[derive(Debug)]
pub enum Completion {
    Refreshed(Result<Snapshot, Error>),
    Grown(Result<Snapshot, Error>),
    LogLoaded {
        job_id: String,
        attempt: Option<u32>,
        result: Result<String, Error>,
    },
    AttemptsLoaded {
        job_id: String,
        result: Result<Vec<Attempt>, Error>,
    },
    DownloadProgress {
        job_id: String,
        batch: u64,
        progress: BatchProgress,
    },
    DownloadFinished {
        job_id: String,
        batch: u64,
        result: Result<BatchReport, Error>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub redraw: bool,
    pub effect: Option<Effect>,
}

impl Outcome {
    /// Nothing changed.
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn redraw() -> Self {
        Self {
            redraw: true,
            effect: None,
        }
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            redraw: true,
            effect: Some(effect),
        }
    }
}

pub struct Dashboard {
    registry: Arc<JobRegistry>,
    snapshot: Snapshot,
    filter: ViewFilter,
    nav: Navigator,
    /// Search bar buffer; `Some` while the bar is open.
    search_input: Option<String>,
    cursor: usize,
    status: Option<String>,
    jobs_error: Option<String>,
    loading: bool,
    attempts: bool,
    /// Id handed to the most recently started download batch.
    batches: u64,
}

impl Dashboard {
    /// `attempts` inserts the attempt list between jobs and log.
    pub fn new(registry: Arc<JobRegistry>, attempts: bool) -> Self {
        let snapshot = registry.snapshot();
        Self {
            registry,
            snapshot,
            filter: ViewFilter::None,
            nav: Navigator::new(),
            search_input: None,
            cursor: 0,
            status: None,
            jobs_error: None,
            loading: false,
            attempts,
            batches: 0,
        }
    }

    /// First fetch.
    pub fn start(&mut self) -> Outcome {
        self.loading = true;
        Outcome::effect(Effect::Refresh)
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn window(&self) -> Window {
        self.snapshot.window
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn screen(&self) -> &Screen {
        self.nav.current()
    }

    pub fn search_input(&self) -> Option<&str> {
        self.search_input.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Error from the latest fetch; the job list is withheld while set.
    pub fn jobs_error(&self) -> Option<&str> {
        self.jobs_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn attempts_enabled(&self) -> bool {
        self.attempts
    }

    pub fn step(&self) -> usize {
        self.registry.step()
    }

    /// Jobs on the list, after window and filter.
    pub fn visible_jobs(&self) -> Vec<&Job> {
        filter::visible(&self.snapshot.records, self.snapshot.window, &self.filter)
    }

    pub fn focused_job(&self) -> Option<&Job> {
        if self.jobs_error.is_some() {
            return None;
        }
        self.visible_jobs().get(self.cursor).copied()
    }

    /// One-line description of the jobs window for the status bar.
    pub fn summary(&self) -> String {
        let window = self.snapshot.window;
        let mut s = format!(
            "{} shown | window {}/{} | filter {}",
            self.visible_jobs().len(),
            window.visible(),
            window.requested(),
            self.filter.describe()
        );
        if let Some(owner) = self.registry.owner() {
            s.push_str(&format!(" | owner {owner}"));
        }
        if self.loading {
            s.push_str(" | fetching");
        }
        s
    }

    /// Whether `action` would do anything right now.
    pub fn is_legal(&self, action: Action) -> bool {
        if !nav::is_legal(action, self.nav.kind()) {
            return false;
        }
        match action {
            Action::Shrink => self.snapshot.window.can_shrink(self.step()),
            Action::Select => match self.nav.current() {
                Screen::Jobs => self.focused_job().is_some(),
                Screen::Trials(view) => view.selected().is_some(),
                Screen::Log(_) => false,
            },
            Action::Download => self
                .nav
                .log_view()
                .is_some_and(|v| !v.outputs.is_empty() && !v.download_running()),
            _ => true,
        }
    }

    /// Actions currently legal, in binding order.
    pub fn legal_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.is_legal(*a))
            .collect()
    }

    pub fn dispatch(&mut self, action: Action) -> Outcome {
        if !self.is_legal(action) {
            tracing::trace!(?action, screen = ?self.nav.kind(), "action ignored");
            return Outcome::ignored();
        }
        match action {
            Action::Quit => Outcome {
                redraw: false,
                effect: Some(Effect::Quit),
            },
            Action::Refresh => {
                self.loading = true;
                Outcome::effect(Effect::Refresh)
            }
            Action::Grow => {
                self.loading = true;
                Outcome::effect(Effect::Grow(self.step()))
            }
            Action::Shrink => {
                self.snapshot = self.registry.shrink(self.step());
                self.clamp_cursor();
                Outcome::redraw()
            }
            Action::ShowAll => self.set_filter(ViewFilter::None),
            Action::ShowDone => self.set_filter(ViewFilter::Status(JobStatus::Done)),
            Action::ShowRunning => self.set_filter(ViewFilter::Status(JobStatus::Running)),
            Action::ShowFailed => self.set_filter(ViewFilter::Status(JobStatus::Failed)),
            Action::Search => self.toggle_search(),
            Action::Select => self.select(),
            Action::Back => {
                let left: Vec<Screen> = self.nav.back().into_iter().collect();
                self.leave(left)
            }
            Action::Home => {
                let left = self.nav.home();
                self.leave(left)
            }
            Action::Download => self.start_download(),
        }
    }

    fn set_filter(&mut self, filter: ViewFilter) -> Outcome {
        self.search_input = None;
        self.filter = filter;
        self.cursor = 0;
        Outcome::redraw()
    }

    fn toggle_search(&mut self) -> Outcome {
        if self.search_input.take().is_some() {
            if self.filter.query().is_some() {
                self.filter = ViewFilter::None;
                self.cursor = 0;
            }
        } else {
            self.search_input = Some(self.filter.query().unwrap_or_default().to_string());
        }
        Outcome::redraw()
    }

    /// Append to the open search bar.
    pub fn search_push(&mut self, ch: char) -> Outcome {
        match self.search_input.as_mut() {
            Some(buf) => {
                buf.push(ch);
                Outcome::redraw()
            }
            None => Outcome::ignored(),
        }
    }

    pub fn search_pop(&mut self) -> Outcome {
        match self.search_input.as_mut() {
            Some(buf) => {
                buf.pop();
                Outcome::redraw()
            }
            None => Outcome::ignored(),
        }
    }

    /// Commit the search bar as the active search and close it.
    pub fn search_commit(&mut self) -> Outcome {
        match self.search_input.take() {
            Some(query) => {
                tracing::debug!(query = %query, "search committed");
                self.filter = ViewFilter::search(query);
                self.cursor = 0;
                Outcome::redraw()
            }
            None => Outcome::ignored(),
        }
    }

    /// Close the search bar, keeping the active filter.
    pub fn search_cancel(&mut self) -> Outcome {
        match self.search_input.take() {
            Some(_) => Outcome::redraw(),
            None => Outcome::ignored(),
        }
    }

    /// Move the job or attempt cursor, or scroll the log, by `delta`.
    pub fn move_cursor(&mut self, delta: isize) -> Outcome {
        let visible = self.visible_jobs().len();
        let (current, len) = match self.nav.current() {
            Screen::Jobs => (self.cursor, visible),
            Screen::Trials(view) => (
                view.cursor,
                view.attempts.as_ref().map_or(0, |a| a.len()),
            ),
            Screen::Log(view) => (
                view.scroll,
                view.text.as_deref().map_or(0, |t| t.lines().count()),
            ),
        };
        if len == 0 {
            return Outcome::ignored();
        }
        let next = offset_index(current, delta, len);
        if next == current {
            return Outcome::ignored();
        }
        match self.nav.current_mut() {
            Some(Screen::Trials(view)) => view.cursor = next,
            Some(Screen::Log(view)) => view.scroll = next,
            _ => self.cursor = next,
        }
        Outcome::redraw()
    }

    fn select(&mut self) -> Outcome {
        match self.nav.current() {
            Screen::Jobs => {
                let Some(job) = self.focused_job().cloned() else {
                    return Outcome::ignored();
                };
                self.search_input = None;
                let job_id = job.id;
                if self.attempts {
                    self.nav
                        .push(Screen::Trials(TrialsView::new(job_id.clone(), job.outputs)));
                    Outcome::effect(Effect::LoadAttempts { job_id })
                } else {
                    self.nav
                        .push(Screen::Log(LogView::new(job_id.clone(), None, job.outputs)));
                    Outcome::effect(Effect::LoadLog {
                        job_id,
                        attempt: None,
                    })
                }
            }
            Screen::Trials(view) => {
                let Some(attempt) = view.selected() else {
                    return Outcome::ignored();
                };
                // Outputs are produced by the final attempt only.
                let outputs = if attempt.is_final {
                    view.outputs.clone()
                } else {
                    Vec::new()
                };
                let log = LogView::new(view.job_id.clone(), Some(attempt.index), outputs)
                    .with_text(attempt.log.clone());
                self.nav.push(Screen::Log(log));
                Outcome::redraw()
            }
            Screen::Log(_) => Outcome::ignored(),
        }
    }

    fn leave(&mut self, left: Vec<Screen>) -> Outcome {
        let cancel = left.into_iter().find_map(|screen| match screen {
            Screen::Log(view) if view.download_running() => Some(view.job_id),
            _ => None,
        });
        if self.nav.kind() == nav::ScreenKind::Jobs {
            self.clamp_cursor();
        }
        match cancel {
            Some(job_id) => {
                self.status = Some(format!("download for {job_id} cancelled"));
                Outcome::effect(Effect::CancelDownload { job_id })
            }
            None => Outcome::redraw(),
        }
    }

    fn start_download(&mut self) -> Outcome {
        let Some(view) = self.nav.log_view_mut() else {
            return Outcome::ignored();
        };
        self.batches += 1;
        let batch = self.batches;
        let outputs = view.outputs.clone();
        let job_id = view.job_id.clone();
        view.download = Some(DownloadState::Running {
            batch,
            progress: BatchProgress::new(outputs.len()),
        });
        self.status = Some(format!("downloading {} outputs of {job_id}", outputs.len()));
        Outcome::effect(Effect::Download {
            job_id,
            batch,
            outputs,
        })
    }

    /// Fold a background result into the view state.
    pub fn apply(&mut self, completion: Completion) -> Outcome {
        match completion {
            Completion::Refreshed(result) | Completion::Grown(result) => {
                self.loading = false;
                match result {
                    Ok(fetched) => {
                        // A shrink may have landed after this result was produced;
                        // the registry holds the window that is actually current.
                        let current = self.registry.snapshot();
                        if current.window != fetched.window {
                            tracing::debug!(
                                generation = fetched.generation,
                                "superseded window discarded"
                            );
                        }
                        self.snapshot = current;
                        self.jobs_error = None;
                        self.clamp_cursor();
                        Outcome::redraw()
                    }
                    Err(e) if e.is_fatal() => {
                        tracing::error!("job listing unusable: {}", e);
                        Outcome::effect(Effect::Exit(e.to_string()))
                    }
                    Err(e) => {
                        tracing::warn!("job listing failed: {}", error_chain(&e));
                        self.jobs_error = Some(e.to_string());
                        Outcome::redraw()
                    }
                }
            }
            Completion::LogLoaded {
                job_id,
                attempt,
                result,
            } => {
                let Some(view) = self
                    .nav
                    .log_view_mut()
                    .filter(|v| v.job_id == job_id && v.attempt == attempt && v.text.is_none())
                else {
                    tracing::debug!(job_id = %job_id, ?attempt, "stale log discarded");
                    return Outcome::ignored();
                };
                match result {
                    Ok(text) => view.text = Some(text),
                    Err(e) => view.error = Some(e.to_string()),
                }
                Outcome::redraw()
            }
            Completion::AttemptsLoaded { job_id, result } => {
                let Some(view) = self
                    .nav
                    .trials_view_mut()
                    .filter(|v| v.job_id == job_id && v.attempts.is_none())
                else {
                    tracing::debug!(job_id = %job_id, "stale attempt list discarded");
                    return Outcome::ignored();
                };
                match result {
                    Ok(attempts) => {
                        view.cursor = attempts.len().saturating_sub(1);
                        view.attempts = Some(attempts);
                    }
                    Err(e) => view.error = Some(e.to_string()),
                }
                Outcome::redraw()
            }
            Completion::DownloadProgress {
                job_id,
                batch,
                progress,
            } => {
                match running_download_view(&mut self.nav, &job_id, batch) {
                    Some(view) => {
                        view.download = Some(DownloadState::Running { batch, progress });
                        Outcome::redraw()
                    }
                    None => Outcome::ignored(),
                }
            }
            Completion::DownloadFinished {
                job_id,
                batch,
                result,
            } => {
                let Some(view) = running_download_view(&mut self.nav, &job_id, batch) else {
                    tracing::debug!(job_id = %job_id, batch, "stale download result discarded");
                    return Outcome::ignored();
                };
                match result {
                    Ok(report) => {
                        let summary = report.summary();
                        view.download = Some(DownloadState::Finished(report));
                        self.status = Some(summary);
                    }
                    Err(e) => {
                        view.download = None;
                        self.status = Some(format!("download failed: {e}"));
                    }
                }
                Outcome::redraw()
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_jobs().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("screen", &self.nav.kind())
            .field("window", &self.snapshot.window)
            .field("filter", &self.filter)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

fn error_chain(e: &Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// The log screen running `batch` for `job_id`, if it is still open.
fn running_download_view<'a>(
    nav: &'a mut Navigator,
    job_id: &str,
    batch: u64,
) -> Option<&'a mut LogView> {
    nav.log_view_mut()
        .filter(|v| v.job_id == job_id && v.running_batch() == Some(batch))
}

fn offset_index(current: usize, delta: isize, len: usize) -> usize {
    let last = len.saturating_sub(1);
    if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta.unsigned_abs()).min(last)
    }
}
