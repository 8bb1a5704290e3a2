//! Fetch/display window: how many jobs are requested from the source and
//! how many of those are shown.

/// `(requested, visible)` with `visible <= requested` at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    requested: usize,
    visible: usize,
}

impl Window {
    /// Start with `initial` jobs requested and all of them visible.
    pub fn new(initial: usize) -> Self {
        let initial = initial.max(1);
        Self {
            requested: initial,
            visible: initial,
        }
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// True when showing `step` more jobs needs a larger fetch first.
    pub fn needs_fetch_to_grow(&self, step: usize) -> bool {
        self.visible.saturating_add(step) > self.requested
    }

    /// Double the fetch size. Called before re-fetching for a grow.
    pub(crate) fn double_requested(&mut self) {
        self.requested = self.requested.saturating_mul(2);
    }

    pub(crate) fn set_requested(&mut self, requested: usize) {
        self.requested = requested.max(1);
        self.visible = self.visible.min(self.requested);
    }

    /// Show `step` more, never past `requested`.
    pub(crate) fn extend(&mut self, step: usize) {
        self.visible = self.visible.saturating_add(step).min(self.requested);
    }

    /// Show `step` fewer, never below one step. No-op when already at or
    /// below one step.
    pub fn shrink(&mut self, step: usize) {
        if self.visible > step {
            self.visible = (self.visible - step).max(step);
        }
    }

    pub fn can_shrink(&self, step: usize) -> bool {
        self.visible > step
    }

    /// Clamp after a fetch that returned `available` records. An exhausted
    /// source caps the visible count, but one step stays the floor.
    pub(crate) fn clamp_to_available(&mut self, available: usize, step: usize) {
        if available < self.requested {
            let cap = available.max(step).min(self.requested);
            self.visible = self.visible.min(cap);
        }
    }
}
