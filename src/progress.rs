//! Progress reporting side channel for long-running operations.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Receiver of progress updates.
///
/// Implementations must tolerate calls from several worker threads at once.
pub trait Progress: Send + Sync {
    /// A new stage begins with `total` units of work.
    fn start(&self, stage: &str, total: u64);
    /// `n` more units are done.
    fn advance(&self, n: u64);
    /// The current stage is complete.
    fn finish(&self);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _stage: &str, _total: u64) {}
    fn advance(&self, _n: u64) {}
    fn finish(&self) {}
}

/// Progress state that can be polled from another thread.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    stage: Mutex<String>,
    total: AtomicU64,
    done: AtomicU64,
    finished: AtomicBool,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the current stage.
    pub fn stage(&self) -> String {
        self.stage.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// `(done, total)` for the current stage.
    pub fn position(&self) -> (u64, u64) {
        (
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    /// Completed fraction in `[0, 1]`; an empty stage counts as complete.
    pub fn fraction(&self) -> f64 {
        let (done, total) = self.position();
        if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).min(1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl Progress for ProgressCounter {
    fn start(&self, stage: &str, total: u64) {
        if let Ok(mut s) = self.stage.lock() {
            *s = stage.to_string();
        }
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
        self.finished.store(false, Ordering::Release);
    }

    fn advance(&self, n: u64) {
        self.done.fetch_add(n, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }
}
