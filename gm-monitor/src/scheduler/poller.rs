//! Poll scheduler
//!
//! One coordinating task runs poll cycles over the watch-list. Each cycle
//! spawns a fetch task per repository, gated by a semaphore so at most
//! `max_in_flight` requests run at once. Tasks report back over a channel and
//! never touch shared state; the coordinating task reconciles the results in
//! watch-list order and is the only writer to the snapshot store.

use chrono::{DateTime, Utc};
use gm_client::CiProvider;
use gm_core::domain::error::FetchError;
use gm_core::domain::run::WorkflowRun;
use gm_core::domain::snapshot::{RepositorySnapshot, Snapshot};
use gm_core::domain::target::WatchTarget;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::MonitorConfig;
use crate::scheduler::handle::MonitorHandle;
use crate::scheduler::state::{CyclePhase, SchedulerState};
use crate::store::SnapshotStore;

/// Result of one fetch task
struct FetchOutcome {
    /// Position of the target in the watch-list
    index: usize,
    result: Result<Vec<WorkflowRun>, FetchError>,
    finished_at: DateTime<Utc>,
}

/// Poll scheduler over a fixed watch-list
pub struct Poller {
    config: MonitorConfig,
    targets: Arc<[WatchTarget]>,
    provider: Arc<dyn CiProvider>,
    semaphore: Arc<Semaphore>,
    store: SnapshotStore,
    state: Arc<SchedulerState>,
}

impl Poller {
    /// Creates a new poller
    ///
    /// # Arguments
    /// * `config` - Interval, fan-out bound and cycle deadline
    /// * `targets` - The watch-list, in display order
    /// * `provider` - Where runs are fetched from
    pub fn new(
        config: MonitorConfig,
        targets: Vec<WatchTarget>,
        provider: Arc<dyn CiProvider>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            config,
            targets: targets.into(),
            provider,
            semaphore,
            store: SnapshotStore::new(),
            state: Arc::new(SchedulerState::new()),
        }
    }

    /// Store the poller publishes into
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Starts the polling loop on the current runtime
    ///
    /// The first cycle starts immediately. Dropping the returned handle
    /// stops the scheduler the next time it waits for a signal: a cycle
    /// already running finishes and publishes first. Use
    /// [`MonitorHandle::request_quit`] to abandon it instead.
    pub fn spawn(self) -> MonitorHandle {
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let store = self.store.clone();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(self.run(refresh_rx, shutdown.clone()));

        MonitorHandle::new(store, state, refresh_tx, shutdown, task)
    }

    /// Runs a single cycle and publishes its snapshot
    ///
    /// Used for one-shot output where no scheduler loop is needed.
    pub async fn poll_once(&self) -> Arc<Snapshot> {
        let snapshot = self.run_cycle(&CancellationToken::new()).await;
        let published = self.store.publish(snapshot);
        self.state.arm(Instant::now() + self.config.poll_interval);
        published
    }

    /// The coordinating loop
    async fn run(self, mut refresh_rx: mpsc::Receiver<()>, shutdown: CancellationToken) {
        info!(
            "Starting poll scheduler ({} target(s), interval: {:?}, max in flight: {})",
            self.targets.len(),
            self.config.poll_interval,
            self.config.max_in_flight
        );

        let mut next_poll = Instant::now();
        self.state.arm(next_poll);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                signal = refresh_rx.recv() => match signal {
                    Some(()) => debug!("Manual refresh requested"),
                    None => {
                        debug!("Monitor handle dropped");
                        break;
                    }
                },
                _ = time::sleep_until(next_poll) => debug!("Poll interval elapsed"),
            }

            let snapshot = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Quit requested during a poll cycle, abandoning in-flight fetches");
                    break;
                }
                snapshot = self.run_cycle(&shutdown) => snapshot,
            };

            self.store.publish(snapshot);
            self.state.set_phase(CyclePhase::Published);

            let mut dropped = 0;
            while refresh_rx.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                debug!("Dropped {} refresh request(s) received mid-cycle", dropped);
            }

            next_poll = Instant::now() + self.config.poll_interval;
            self.state.arm(next_poll);
        }

        self.state.set_phase(CyclePhase::Stopped);
        info!("Poll scheduler stopped");
    }

    /// Fetches every target and reconciles the results into a snapshot
    async fn run_cycle(&self, shutdown: &CancellationToken) -> Snapshot {
        let generation = self.store.current().generation + 1;
        let span = info_span!("poll_cycle", generation);

        async {
            let started = Instant::now();

            self.state.set_phase(CyclePhase::Fetching);
            let (outcomes, timed_out) = self.fetch_all(shutdown).await;

            self.state.set_phase(CyclePhase::Reconciling);
            let snapshot = self.reconcile(generation, outcomes, timed_out);

            info!(
                "Cycle finished in {:?}: {} target(s), {} error(s)",
                started.elapsed(),
                snapshot.repositories.len(),
                snapshot.error_count()
            );
            snapshot
        }
        .instrument(span)
        .await
    }

    /// Fans out one fetch per target and collects outcomes by index
    ///
    /// Returns when every task has reported or the cycle deadline passes,
    /// whichever comes first. Tasks still running at that point are aborted.
    async fn fetch_all(&self, shutdown: &CancellationToken) -> (Vec<Option<FetchOutcome>>, bool) {
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for (index, target) in self.targets.iter().enumerate() {
            tasks.spawn(
                fetch_target(
                    index,
                    target.clone(),
                    Arc::clone(&self.provider),
                    Arc::clone(&self.semaphore),
                    shutdown.child_token(),
                    results_tx.clone(),
                )
                .in_current_span(),
            );
        }
        drop(results_tx);

        let mut outcomes: Vec<Option<FetchOutcome>> = self.targets.iter().map(|_| None).collect();
        let mut timed_out = false;

        let deadline = time::sleep(self.config.cycle_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                outcome = results_rx.recv() => match outcome {
                    Some(outcome) => {
                        let index = outcome.index;
                        outcomes[index] = Some(outcome);
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    let outstanding = outcomes.iter().filter(|o| o.is_none()).count();
                    warn!(
                        "Cycle timeout ({:?}) elapsed with {} fetch(es) outstanding",
                        self.config.cycle_timeout, outstanding
                    );
                    timed_out = true;
                    break;
                }
            }
        }

        tasks.abort_all();
        (outcomes, timed_out)
    }

    /// Builds the snapshot in watch-list order
    fn reconcile(
        &self,
        generation: u64,
        outcomes: Vec<Option<FetchOutcome>>,
        timed_out: bool,
    ) -> Snapshot {
        let now = Utc::now();

        let repositories = self
            .targets
            .iter()
            .zip(outcomes)
            .map(|(target, outcome)| match outcome {
                Some(outcome) => {
                    RepositorySnapshot::from_result(target, outcome.result, outcome.finished_at)
                }
                None if timed_out => RepositorySnapshot::failed(
                    target,
                    FetchError::timeout(format!(
                        "no response within the {}s cycle timeout",
                        self.config.cycle_timeout.as_secs()
                    )),
                    now,
                ),
                None => RepositorySnapshot::failed(
                    target,
                    FetchError::network("fetch task ended without a result"),
                    now,
                ),
            })
            .collect();

        Snapshot::new(generation, repositories, now)
    }
}

/// Fetches one target once a semaphore permit is available
async fn fetch_target(
    index: usize,
    target: WatchTarget,
    provider: Arc<dyn CiProvider>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    results: mpsc::UnboundedSender<FetchOutcome>,
) {
    let fetch = async {
        // The permit is held until this future completes or is dropped
        let _permit = semaphore.acquire_owned().await.ok()?;
        Some(provider.fetch_runs(&target).await)
    };

    let result = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Fetch for {} cancelled", target);
            return;
        }
        result = fetch => match result {
            Some(result) => result,
            None => return,
        },
    };

    match &result {
        Ok(runs) => debug!("Fetched {} run(s) for {}", runs.len(), target),
        Err(e) => warn!("Failed to fetch {}: {}", target, e),
    }

    // A closed channel means the cycle already moved on without us
    let _ = results.send(FetchOutcome {
        index,
        result,
        finished_at: Utc::now(),
    });
}
