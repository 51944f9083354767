use async_trait::async_trait;
use chrono::Utc;
use gm_client::CiProvider;
use gm_core::domain::error::{FetchError, FetchErrorKind};
use gm_core::domain::run::{RunStatus, WorkflowRun};
use gm_core::domain::snapshot::Snapshot;
use gm_core::domain::target::WatchTarget;
use gm_monitor::{CyclePhase, MonitorConfig, MonitorHandle, Poller};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{self, Instant};

/// What a scripted repository does when fetched
#[derive(Clone)]
enum Script {
    Runs(RunStatus),
    Fail(FetchError),
    Hang,
}

#[derive(Clone)]
struct Behavior {
    delay: Duration,
    script: Script,
}

#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    abandoned: AtomicUsize,
}

/// Tracks one fetch; counts it as abandoned if dropped before completing
struct FetchGuard {
    counters: Arc<Counters>,
    completed: bool,
}

impl FetchGuard {
    fn start(counters: Arc<Counters>) -> Self {
        counters.calls.fetch_add(1, Ordering::SeqCst);
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            counters,
            completed: false,
        }
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            self.counters.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct ScriptedProvider {
    behaviors: HashMap<String, Behavior>,
    counters: Arc<Counters>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    fn script(mut self, repository: &str, delay: Duration, script: Script) -> Self {
        self.behaviors
            .insert(repository.to_string(), Behavior { delay, script });
        self
    }

    fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl CiProvider for ScriptedProvider {
    async fn fetch_runs(&self, target: &WatchTarget) -> Result<Vec<WorkflowRun>, FetchError> {
        let mut guard = FetchGuard::start(self.counters());
        let behavior = self
            .behaviors
            .get(&target.repository)
            .cloned()
            .unwrap_or(Behavior {
                delay: Duration::ZERO,
                script: Script::Runs(RunStatus::Success),
            });

        if !behavior.delay.is_zero() {
            time::sleep(behavior.delay).await;
        }

        let result = match behavior.script {
            Script::Runs(status) => Ok(vec![WorkflowRun::new(
                format!("{} CI", target.repository),
                status,
                Utc::now(),
            )]),
            Script::Fail(error) => Err(error),
            Script::Hang => std::future::pending().await,
        };

        guard.completed = true;
        result
    }
}

fn targets(names: &[&str]) -> Vec<WatchTarget> {
    names.iter().map(|name| WatchTarget::new("acme", *name)).collect()
}

fn spawn(config: MonitorConfig, names: &[&str], provider: ScriptedProvider) -> MonitorHandle {
    Poller::new(config, targets(names), Arc::new(provider)).spawn()
}

async fn wait_for_generation(handle: &MonitorHandle, generation: u64) -> Arc<Snapshot> {
    let mut rx = handle.subscribe();
    let snapshot = rx
        .wait_for(|snapshot| snapshot.generation >= generation)
        .await
        .expect("scheduler stopped before publishing");
    snapshot.clone()
}

fn repo_names(snapshot: &Snapshot) -> Vec<&str> {
    snapshot
        .repositories
        .iter()
        .map(|repo| repo.repository.as_str())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_follows_watch_list_order() {
    // Later targets finish first
    let provider = ScriptedProvider::new()
        .script("alpha", Duration::from_secs(3), Script::Runs(RunStatus::Success))
        .script("beta", Duration::from_secs(2), Script::Runs(RunStatus::Running))
        .script("gamma", Duration::from_secs(1), Script::Runs(RunStatus::Failure));

    let handle = spawn(MonitorConfig::default(), &["alpha", "beta", "gamma"], provider);
    let snapshot = wait_for_generation(&handle, 1).await;

    assert_eq!(snapshot.generation, 1);
    assert_eq!(repo_names(&snapshot), vec!["alpha", "beta", "gamma"]);
    assert_eq!(
        snapshot.repositories[0].latest_status(),
        Some(RunStatus::Success)
    );
    assert_eq!(
        snapshot.repositories[1].latest_status(),
        Some(RunStatus::Running)
    );
    assert_eq!(
        snapshot.repositories[2].latest_status(),
        Some(RunStatus::Failure)
    );

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_target_does_not_affect_others() {
    let provider = ScriptedProvider::new().script(
        "two",
        Duration::from_millis(500),
        Script::Fail(FetchError::auth_failure("status 401: Bad credentials")),
    );

    let handle = spawn(
        MonitorConfig::default(),
        &["one", "two", "three", "four"],
        provider,
    );
    let snapshot = wait_for_generation(&handle, 1).await;

    assert_eq!(snapshot.repositories.len(), 4);
    assert_eq!(snapshot.error_count(), 1);

    let failed = &snapshot.repositories[1];
    assert_eq!(failed.repository, "two");
    assert!(failed.runs.is_empty());
    assert_eq!(
        failed.last_error.as_ref().map(|e| e.kind),
        Some(FetchErrorKind::AuthFailure)
    );

    for index in [0, 2, 3] {
        let repo = &snapshot.repositories[index];
        assert!(repo.last_error.is_none(), "{} should be healthy", repo.repository);
        assert_eq!(repo.latest_status(), Some(RunStatus::Success));
    }

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_fan_out_is_bounded() {
    let mut provider = ScriptedProvider::new();
    let names = ["a", "b", "c", "d", "e", "f"];
    for name in names {
        provider = provider.script(name, Duration::from_secs(1), Script::Runs(RunStatus::Success));
    }
    let counters = provider.counters();

    let start = Instant::now();
    let config = MonitorConfig::default().with_max_in_flight(2);
    let handle = spawn(config, &names, provider);
    let snapshot = wait_for_generation(&handle, 1).await;

    assert_eq!(snapshot.repositories.len(), 6);
    assert_eq!(snapshot.error_count(), 0);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 6);
    assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 2);
    // Three waves of two
    assert!(start.elapsed() >= Duration::from_secs(3));

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_hung_fetch_is_recorded_as_timeout() {
    let provider = ScriptedProvider::new().script("stuck", Duration::ZERO, Script::Hang);
    let counters = provider.counters();

    let config = MonitorConfig::default().with_cycle_timeout(Duration::from_secs(5));
    let start = Instant::now();
    let handle = spawn(config, &["fine", "stuck"], provider);
    let snapshot = wait_for_generation(&handle, 1).await;

    assert!(start.elapsed() >= Duration::from_secs(5));
    assert!(snapshot.repositories[0].last_error.is_none());

    let stuck = &snapshot.repositories[1];
    assert!(stuck.runs.is_empty());
    assert!(stuck.last_error.as_ref().is_some_and(|e| e.is_timeout()));

    // The hung fetch is aborted, not left running
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(counters.abandoned.load(Ordering::SeqCst), 1);
    assert_eq!(counters.in_flight.load(Ordering::SeqCst), 0);

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_refresh_during_cycle_is_dropped() {
    let provider = ScriptedProvider::new().script(
        "slow",
        Duration::from_secs(10),
        Script::Runs(RunStatus::Success),
    );
    let counters = provider.counters();

    let start = Instant::now();
    let handle = spawn(MonitorConfig::default(), &["slow"], provider);

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.phase(), CyclePhase::Fetching);
    assert_eq!(handle.seconds_until_next_poll(), 0);
    handle.request_refresh();
    handle.request_refresh();

    wait_for_generation(&handle, 1).await;
    assert_eq!(handle.phase(), CyclePhase::Idle);
    assert_eq!(handle.seconds_until_next_poll(), 60);

    // No extra cycle comes from the refreshes sent mid-cycle
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(handle.current().generation, 1);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 1);

    // The next cycle is the timer-driven one
    let snapshot = wait_for_generation(&handle, 2).await;
    assert_eq!(snapshot.generation, 2);
    assert!(start.elapsed() >= Duration::from_secs(80));
    assert_eq!(counters.calls.load(Ordering::SeqCst), 2);

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_refresh_while_idle_starts_cycle_and_resets_timer() {
    let provider = ScriptedProvider::new();
    let counters = provider.counters();

    let start = Instant::now();
    let handle = spawn(MonitorConfig::default(), &["quick"], provider);

    wait_for_generation(&handle, 1).await;
    assert_eq!(handle.seconds_until_next_poll(), 60);

    time::sleep(Duration::from_secs(20)).await;
    assert_eq!(handle.seconds_until_next_poll(), 40);

    handle.request_refresh();
    wait_for_generation(&handle, 2).await;
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(handle.seconds_until_next_poll(), 60);

    // Two requests before the scheduler wakes collapse into one cycle
    handle.request_refresh();
    handle.request_refresh();
    wait_for_generation(&handle, 3).await;

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.current().generation, 3);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 3);

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_quit_abandons_in_flight_fetches() {
    let provider = ScriptedProvider::new().script("forever", Duration::ZERO, Script::Hang);
    let counters = provider.counters();

    let handle = spawn(MonitorConfig::default(), &["forever", "other"], provider);
    let reader = handle.subscribe();

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.phase(), CyclePhase::Fetching);

    handle.request_quit();
    handle.request_refresh();
    handle.join().await;

    // Nothing was published for the abandoned cycle
    assert_eq!(reader.borrow().generation, 0);

    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(counters.abandoned.load(Ordering::SeqCst), 1);
    assert_eq!(counters.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_quit_while_idle_stops_polling() {
    let provider = ScriptedProvider::new();
    let counters = provider.counters();

    let handle = spawn(MonitorConfig::default(), &["repo"], provider);
    wait_for_generation(&handle, 1).await;
    let reader = handle.subscribe();

    handle.request_quit();
    time::sleep(Duration::from_millis(10)).await;
    assert!(handle.is_stopped());
    assert_eq!(handle.seconds_until_next_poll(), 0);
    handle.join().await;

    time::sleep(Duration::from_secs(300)).await;
    assert_eq!(reader.borrow().generation, 1);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_lets_running_cycle_publish() {
    let provider = ScriptedProvider::new().script(
        "slow",
        Duration::from_secs(5),
        Script::Runs(RunStatus::Success),
    );
    let counters = provider.counters();

    let poller = Poller::new(MonitorConfig::default(), targets(&["slow"]), Arc::new(provider));
    let store = poller.store().clone();
    let handle = poller.spawn();

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.phase(), CyclePhase::Fetching);
    drop(handle);

    // Unlike quit, the running cycle completes and publishes
    let snapshot = store
        .subscribe()
        .wait_for(|snapshot| snapshot.generation >= 1)
        .await
        .expect("store closed")
        .clone();
    assert_eq!(snapshot.repositories[0].latest_status(), Some(RunStatus::Success));
    assert_eq!(counters.abandoned.load(Ordering::SeqCst), 0);

    // No further cycle follows
    time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.current().generation, 1);
    assert_eq!(counters.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_watch_list_publishes_empty_snapshots() {
    let handle = spawn(MonitorConfig::default(), &[], ScriptedProvider::new());
    let snapshot = wait_for_generation(&handle, 1).await;

    assert!(snapshot.repositories.is_empty());
    assert!(snapshot.is_populated());

    handle.request_quit();
    handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_once_publishes_single_snapshot() {
    let provider = ScriptedProvider::new().script(
        "api",
        Duration::from_secs(1),
        Script::Fail(FetchError::rate_limited("status 429: slow down")),
    );

    let poller = Poller::new(MonitorConfig::default(), targets(&["api", "web"]), Arc::new(provider));
    let snapshot = poller.poll_once().await;

    assert_eq!(snapshot.generation, 1);
    assert_eq!(poller.store().current().generation, 1);
    assert_eq!(
        snapshot.repositories[0].last_error.as_ref().map(|e| e.kind),
        Some(FetchErrorKind::RateLimited)
    );
    assert!(snapshot.repositories[1].last_error.is_none());
}
