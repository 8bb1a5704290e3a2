//! Visible-set computation: window, then status filter or search.
//!
//! Stateless: every call recomputes from the registry snapshot.

use regex::Regex;

use crate::job::{Job, JobStatus};
use crate::registry::Window;

/// At most one of status filter and search is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    None,
    Status(JobStatus),
    Search(String),
}

impl ViewFilter {
    /// Build a search filter; an empty query means no filter.
    pub fn search(query: impl Into<String>) -> Self {
        let query = query.into();
        if query.is_empty() {
            ViewFilter::None
        } else {
            ViewFilter::Search(query)
        }
    }

    pub fn status(&self) -> Option<&JobStatus> {
        match self {
            ViewFilter::Status(s) => Some(s),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            ViewFilter::Search(q) => Some(q),
            _ => None,
        }
    }

    /// Short label for the status line.
    pub fn describe(&self) -> String {
        match self {
            ViewFilter::None => "all".to_string(),
            ViewFilter::Status(s) => s.to_string(),
            ViewFilter::Search(q) => format!("/{q}/"),
        }
    }
}

/// Case-sensitive matcher over name, owner and date. Queries that are not
/// valid regular expressions are matched literally.
#[derive(Debug)]
enum SearchMatcher {
    Pattern(Regex),
    Literal(String),
}

impl SearchMatcher {
    fn new(query: &str) -> Self {
        match Regex::new(query) {
            Ok(re) => SearchMatcher::Pattern(re),
            Err(err) => {
                tracing::debug!(query, %err, "search is not a valid regex, matching literally");
                SearchMatcher::Literal(query.to_string())
            }
        }
    }

    fn is_match(&self, field: &str) -> bool {
        match self {
            SearchMatcher::Pattern(re) => re.is_match(field),
            SearchMatcher::Literal(s) => field.contains(s.as_str()),
        }
    }

    fn matches(&self, job: &Job) -> bool {
        self.is_match(&job.name) || self.is_match(&job.owner) || self.is_match(&job.submitted)
    }
}

/// Jobs to display, in fetch order.
pub fn visible<'a>(records: &'a [Job], window: Window, filter: &ViewFilter) -> Vec<&'a Job> {
    let candidates = records.iter().take(window.visible());
    match filter {
        ViewFilter::None => candidates.collect(),
        ViewFilter::Status(status) => candidates.filter(|j| &j.status == status).collect(),
        ViewFilter::Search(query) => {
            let matcher = SearchMatcher::new(query);
            candidates.filter(|j| matcher.matches(j)).collect()
        }
    }
}
