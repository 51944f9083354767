//! Snapshot store
//!
//! Holds the latest published [`Snapshot`]. The scheduler is the only
//! writer; the display and tests read it at any time. Publication swaps a
//! single `Arc`, so a reader gets either the previous snapshot or the new one
//! in full, and never waits on the network.

use gm_core::domain::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// Latest reconciled view, shared between the scheduler and its readers
#[derive(Clone)]
pub struct SnapshotStore {
    sender: Arc<watch::Sender<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Creates a store holding the initial, empty snapshot
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(Snapshot::initial()));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replaces the current snapshot and wakes subscribers
    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.sender.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.sender.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
