//! Thread-safe progress counter shared by workers and a display poller.
//!
//! The tracker only records progress. It never signals completion: the
//! orchestrator knows a phase is over because it joined its workers.

use std::sync::{Mutex, MutexGuard};

/// A consistent snapshot of a run's progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    pub total: u64,
    pub current: u64,
    pub status: String,
}

impl ProgressState {
    /// Completion percentage; `0.0` when there is nothing to do.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Counter plus status line guarded by one lock.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                total,
                ..ProgressState::default()
            }),
        }
    }

    /// Add `increment` to the counter and optionally replace the status.
    pub fn update(&self, increment: u64, status: Option<&str>) {
        let mut state = self.lock();
        state.current = state.current.saturating_add(increment);
        if let Some(status) = status {
            state.status = status.to_string();
        }
    }

    /// Replace the status without moving the counter.
    pub fn set_status(&self, status: impl Into<String>) {
        self.lock().status = status.into();
    }

    /// Set the expected total once discovery knows it.
    pub fn set_total(&self, total: u64) {
        self.lock().total = total;
    }

    /// Move the counter up to the total, e.g. when a phase ends early.
    pub fn complete(&self, status: Option<&str>) {
        let mut state = self.lock();
        state.current = state.current.max(state.total);
        if let Some(status) = status {
            state.status = status.to_string();
        }
    }

    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    // A panicking worker must not hide the counts of the others.
    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
