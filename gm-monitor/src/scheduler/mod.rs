//! Scheduler layer for the monitor
//!
//! This layer drives poll cycles over the watch-list: it fans out one fetch
//! per repository, reconciles the results into a snapshot, publishes it and
//! re-arms the interval timer. The display talks to it through
//! [`MonitorHandle`].

mod handle;
pub mod poller;
mod state;

pub use handle::MonitorHandle;
pub use poller::Poller;
pub use state::CyclePhase;
