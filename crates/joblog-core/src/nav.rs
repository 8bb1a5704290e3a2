//! Navigation state machine: Jobs -> (Trials) -> Log.
//!
//! Screens live on a stack whose bottom is always `Jobs`. Each screen owns its
//! local data (attempt list, log text, download progress), so popping a
//! screen drops that data and re-entering starts clean.

use crate::attempts::Attempt;
use crate::download::{BatchProgress, BatchReport};

/// Operator actions, named after their key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Refresh,
    Home,
    Back,
    ShowAll,
    ShowDone,
    ShowRunning,
    ShowFailed,
    Grow,
    Shrink,
    Search,
    Select,
    Download,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Quit,
        Action::Refresh,
        Action::Home,
        Action::Back,
        Action::ShowAll,
        Action::ShowDone,
        Action::ShowRunning,
        Action::ShowFailed,
        Action::Grow,
        Action::Shrink,
        Action::Search,
        Action::Select,
        Action::Download,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::Quit => "Quit",
            Action::Refresh => "Refresh",
            Action::Home => "Home",
            Action::Back => "Back",
            Action::ShowAll => "All",
            Action::ShowDone => "Done",
            Action::ShowRunning => "Running",
            Action::ShowFailed => "Failed",
            Action::Grow => "More",
            Action::Shrink => "Less",
            Action::Search => "Search",
            Action::Select => "Open",
            Action::Download => "Download",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    Jobs,
    Trials,
    Log,
}

/// Whether `action` is allowed on a screen of `kind`, independent of any
/// other state. Drives which bindings are offered.
pub fn is_legal(action: Action, kind: ScreenKind) -> bool {
    match action {
        Action::Quit => true,
        Action::Refresh
        | Action::ShowAll
        | Action::ShowDone
        | Action::ShowRunning
        | Action::ShowFailed
        | Action::Grow
        | Action::Shrink
        | Action::Search => kind == ScreenKind::Jobs,
        Action::Home | Action::Back => kind != ScreenKind::Jobs,
        Action::Select => kind != ScreenKind::Log,
        Action::Download => kind == ScreenKind::Log,
    }
}

/// Attempt list for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialsView {
    pub job_id: String,
    /// Outputs of the job; they belong to its final attempt.
    pub outputs: Vec<String>,
    /// `None` while discovery is in flight.
    pub attempts: Option<Vec<Attempt>>,
    pub cursor: usize,
    pub error: Option<String>,
}

impl TrialsView {
    pub fn new(job_id: String, outputs: Vec<String>) -> Self {
        Self {
            job_id,
            outputs,
            attempts: None,
            cursor: 0,
            error: None,
        }
    }

    pub fn selected(&self) -> Option<&Attempt> {
        self.attempts.as_ref()?.get(self.cursor)
    }
}

/// Download state shown on a log screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    /// `batch` identifies the run; results from any other batch are stale.
    Running { batch: u64, progress: BatchProgress },
    Finished(BatchReport),
}

/// Log of one job (or one attempt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub job_id: String,
    pub attempt: Option<u32>,
    pub outputs: Vec<String>,
    /// `None` while the log is being fetched.
    pub text: Option<String>,
    pub scroll: usize,
    pub error: Option<String>,
    pub download: Option<DownloadState>,
}

impl LogView {
    pub fn new(job_id: String, attempt: Option<u32>, outputs: Vec<String>) -> Self {
        Self {
            job_id,
            attempt,
            outputs,
            text: None,
            scroll: 0,
            error: None,
            download: None,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn download_running(&self) -> bool {
        self.running_batch().is_some()
    }

    pub fn running_batch(&self) -> Option<u64> {
        match self.download {
            Some(DownloadState::Running { batch, .. }) => Some(batch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Jobs,
    Trials(TrialsView),
    Log(LogView),
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Jobs => ScreenKind::Jobs,
            Screen::Trials(_) => ScreenKind::Trials,
            Screen::Log(_) => ScreenKind::Log,
        }
    }
}

/// Screen stack. Never empty; index 0 is `Jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            stack: vec![Screen::Jobs],
        }
    }

    pub fn current(&self) -> &Screen {
        // The stack always holds at least `Jobs`.
        self.stack.last().unwrap_or(&Screen::Jobs)
    }

    pub fn current_mut(&mut self) -> Option<&mut Screen> {
        self.stack.last_mut()
    }

    pub fn kind(&self) -> ScreenKind {
        self.current().kind()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn log_view(&self) -> Option<&LogView> {
        match self.current() {
            Screen::Log(v) => Some(v),
            _ => None,
        }
    }

    pub fn log_view_mut(&mut self) -> Option<&mut LogView> {
        match self.current_mut() {
            Some(Screen::Log(v)) => Some(v),
            _ => None,
        }
    }

    pub fn trials_view(&self) -> Option<&TrialsView> {
        match self.current() {
            Screen::Trials(v) => Some(v),
            _ => None,
        }
    }

    pub fn trials_view_mut(&mut self) -> Option<&mut TrialsView> {
        match self.current_mut() {
            Some(Screen::Trials(v)) => Some(v),
            _ => None,
        }
    }

    /// Enter a child screen. `Jobs` is never pushed twice.
    pub fn push(&mut self, screen: Screen) {
        if screen.kind() == ScreenKind::Jobs {
            return;
        }
        tracing::debug!(from = ?self.kind(), to = ?screen.kind(), "navigate");
        self.stack.push(screen);
    }

    /// Leave the current screen; returns it so the caller can tear down
    /// anything it started. `None` on `Jobs`.
    pub fn back(&mut self) -> Option<Screen> {
        if self.stack.len() <= 1 {
            return None;
        }
        let left = self.stack.pop();
        tracing::debug!(to = ?self.kind(), "navigate back");
        left
    }

    /// Return to `Jobs`, handing back every screen left (innermost first).
    pub fn home(&mut self) -> Vec<Screen> {
        let mut left = Vec::new();
        while let Some(screen) = self.back() {
            left.push(screen);
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(job: &str) -> Screen {
        Screen::Log(LogView::new(job.to_string(), None, Vec::new()))
    }

    #[test]
    fn filter_and_window_actions_only_on_jobs() {
        for action in [
            Action::Refresh,
            Action::ShowAll,
            Action::ShowDone,
            Action::ShowRunning,
            Action::ShowFailed,
            Action::Grow,
            Action::Shrink,
            Action::Search,
        ] {
            assert!(is_legal(action, ScreenKind::Jobs), "{action:?}");
            assert!(!is_legal(action, ScreenKind::Trials), "{action:?}");
            assert!(!is_legal(action, ScreenKind::Log), "{action:?}");
        }
    }

    #[test]
    fn home_and_back_never_on_jobs() {
        for action in [Action::Home, Action::Back] {
            assert!(!is_legal(action, ScreenKind::Jobs));
            assert!(is_legal(action, ScreenKind::Trials));
            assert!(is_legal(action, ScreenKind::Log));
        }
    }

    #[test]
    fn select_and_download() {
        assert!(is_legal(Action::Select, ScreenKind::Jobs));
        assert!(is_legal(Action::Select, ScreenKind::Trials));
        assert!(!is_legal(Action::Select, ScreenKind::Log));
        assert!(is_legal(Action::Download, ScreenKind::Log));
        assert!(!is_legal(Action::Download, ScreenKind::Jobs));
    }

    #[test]
    fn quit_always_legal() {
        for kind in [ScreenKind::Jobs, ScreenKind::Trials, ScreenKind::Log] {
            assert!(is_legal(Action::Quit, kind));
        }
    }

    #[test]
    fn back_pops_one_level() {
        let mut nav = Navigator::new();
        nav.push(Screen::Trials(TrialsView::new("job-1".to_string(), Vec::new())));
        nav.push(log("job-1"));
        assert_eq!(nav.kind(), ScreenKind::Log);
        let left = nav.back().unwrap();
        assert_eq!(left.kind(), ScreenKind::Log);
        assert_eq!(nav.kind(), ScreenKind::Trials);
        nav.back();
        assert_eq!(nav.kind(), ScreenKind::Jobs);
        assert!(nav.back().is_none());
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn home_drops_every_child_screen() {
        let mut nav = Navigator::new();
        nav.push(Screen::Trials(TrialsView::new("job-1".to_string(), Vec::new())));
        nav.push(log("job-1"));
        let left = nav.home();
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].kind(), ScreenKind::Log);
        assert_eq!(nav.current(), &Screen::Jobs);
    }

    #[test]
    fn jobs_is_never_pushed() {
        let mut nav = Navigator::new();
        nav.push(Screen::Jobs);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn reentering_trials_starts_without_attempts() {
        let mut nav = Navigator::new();
        let mut view = TrialsView::new("job-1".to_string(), Vec::new());
        view.attempts = Some(vec![Attempt {
            index: 0,
            log: "x".to_string(),
            is_final: true,
        }]);
        nav.push(Screen::Trials(view));
        nav.back();
        nav.push(Screen::Trials(TrialsView::new("job-1".to_string(), Vec::new())));
        assert!(nav.trials_view().unwrap().attempts.is_none());
    }
}
