//! Scheduler state shared with the handle

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Phase of the cycle state machine
///
/// `Idle → Fetching → Reconciling → Published → Idle`, until a quit signal
/// moves the scheduler to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Waiting for the timer or a refresh signal
    Idle,

    /// Fetches for the current cycle are in flight
    Fetching,

    /// Building the new snapshot from the collected results
    Reconciling,

    /// The snapshot was just published; the timer is about to be re-armed
    Published,

    /// The scheduler has shut down
    Stopped,
}

impl CyclePhase {
    /// Whether a cycle is underway
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CyclePhase::Fetching | CyclePhase::Reconciling | CyclePhase::Published
        )
    }
}

struct Inner {
    phase: CyclePhase,
    next_poll_at: Instant,
}

/// Phase and timer, written by the coordinating task and read by the handle
pub(crate) struct SchedulerState {
    inner: Mutex<Inner>,
}

impl SchedulerState {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: CyclePhase::Idle,
                next_poll_at: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn phase(&self) -> CyclePhase {
        self.lock().phase
    }

    pub(crate) fn set_phase(&self, phase: CyclePhase) {
        self.lock().phase = phase;
    }

    /// Returns to `Idle` with the next cycle due at `at`
    pub(crate) fn arm(&self, at: Instant) {
        let mut inner = self.lock();
        inner.phase = CyclePhase::Idle;
        inner.next_poll_at = at;
    }

    /// Whole seconds until the next cycle, rounded up; 0 unless idle
    pub(crate) fn seconds_until_next_poll(&self, now: Instant) -> u64 {
        let inner = self.lock();
        if inner.phase != CyclePhase::Idle {
            return 0;
        }

        let remaining = inner.next_poll_at.saturating_duration_since(now);
        remaining.as_millis().div_ceil(1000) as u64
    }
}
