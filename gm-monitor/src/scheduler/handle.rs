use gm_core::domain::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::scheduler::state::{CyclePhase, SchedulerState};
use crate::store::SnapshotStore;

/// Handle to a running poll scheduler
///
/// Reads never block on the network. Dropping the handle stops the
/// scheduler once it next waits for a signal.
pub struct MonitorHandle {
    store: SnapshotStore,
    state: Arc<SchedulerState>,
    refresh_tx: mpsc::Sender<()>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub(crate) fn new(
        store: SnapshotStore,
        state: Arc<SchedulerState>,
        refresh_tx: mpsc::Sender<()>,
        shutdown: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            store,
            state,
            refresh_tx,
            shutdown,
            task,
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    /// Whole seconds until the next timer-driven cycle, 0 while a cycle runs
    pub fn seconds_until_next_poll(&self) -> u64 {
        self.state.seconds_until_next_poll(Instant::now())
    }

    pub fn phase(&self) -> CyclePhase {
        self.state.phase()
    }

    pub fn is_stopped(&self) -> bool {
        self.phase() == CyclePhase::Stopped
    }

    /// Asks for a cycle to start now
    ///
    /// Ignored while a cycle is in flight. Several requests made while idle
    /// collapse into a single cycle.
    pub fn request_refresh(&self) {
        let phase = self.state.phase();
        if phase != CyclePhase::Idle {
            debug!("Ignoring refresh request while {:?}", phase);
            return;
        }

        match self.refresh_tx.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Refresh already pending");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!("Scheduler is gone, ignoring refresh request");
            }
        }
    }

    /// Stops the scheduler, abandoning any in-flight fetches
    ///
    /// The current snapshot stays readable. No further snapshot is published.
    pub fn request_quit(&self) {
        self.shutdown.cancel();
    }

    /// Waits for the scheduler task to finish
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Poll scheduler task failed: {}", e);
        }
    }
}
