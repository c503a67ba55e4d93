//! Per-run outcome counts.

use serde::Serialize;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Forks the action succeeded on, no-ops included
    pub succeeded: usize,
    /// Subset of `succeeded` where the remote had nothing to do
    pub up_to_date: usize,
    pub failed: usize,
    /// Forks skipped without acting: already processed, or no upstream
    pub skipped: usize,
    pub archived: usize,
}

impl RunSummary {
    /// Forks the action was attempted on
    pub fn acted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.archived
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
