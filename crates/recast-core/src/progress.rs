use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thiserror::Error;

/// Cooperative cancellation flag shared between a caller and in-flight work.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// Cooperative progress/cancellation handle for long-running steps.
///
/// The monitor doubles as the cancellation channel: work checks it at coarse
/// step boundaries (per compilation unit, not per node). Whoever drives the
/// work owns marking the monitor done; [`ProgressMonitor::done`] is
/// idempotent and `Drop` marks done as a backstop so the handle is released
/// on every exit path, including errors.
#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    token: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl ProgressMonitor {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn begin_task(&self, name: &str, total_work: usize) {
        tracing::trace!(task = name, total_work, "begin task");
    }

    pub fn subtask(&self, name: &str) {
        tracing::trace!(subtask = name, "subtask");
    }

    pub fn worked(&self, work: usize) {
        tracing::trace!(work, "worked");
    }

    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn is_done(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn done(&self) {
        if self
            .finished
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::trace!("task done");
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        let pm = ProgressMonitor::new(token.clone());
        assert_eq!(pm.check_cancelled(), Ok(()));
        token.cancel();
        assert_eq!(pm.check_cancelled(), Err(Cancelled));
    }

    #[test]
    fn done_is_idempotent() {
        let pm = ProgressMonitor::default();
        assert!(!pm.is_done());
        pm.done();
        pm.done();
        assert!(pm.is_done());
    }

    #[test]
    fn dropping_marks_done() {
        let pm = ProgressMonitor::default();
        let finished = Arc::clone(&pm.finished);
        drop(pm);
        assert!(finished.load(Ordering::SeqCst));
    }
}
