//! Progress reporting for an output download batch.

/// Snapshot of batch progress (gauge-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    /// Downloads finished so far, successful or not.
    pub completed: usize,
    /// How many of the finished downloads failed.
    pub failed: usize,
    /// Number of output references in the batch.
    pub total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            failed: 0,
            total,
        }
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    pub(crate) fn advance(&mut self, ok: bool) {
        self.completed += 1;
        if !ok {
            self.failed += 1;
        }
    }
}
