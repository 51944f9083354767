//! gm monitor
//!
//! The polling and reconciliation engine behind the gm dashboard.
//!
//! Architecture:
//! - Configuration: poll interval, fan-out bound and cycle deadline
//! - Store: the latest published snapshot, readable at any time
//! - Scheduler: cycle driver, bounded fetch fan-out, and the handle the
//!   display uses to read state and send refresh/quit signals
//!
//! The display never waits on the network. It reads the store and receives
//! a notification whenever a cycle publishes a new snapshot.

pub mod config;
pub mod scheduler;
pub mod store;

pub use config::MonitorConfig;
pub use scheduler::{CyclePhase, MonitorHandle, Poller};
pub use store::SnapshotStore;
