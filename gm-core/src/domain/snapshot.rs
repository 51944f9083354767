//! Snapshot domain types
//!
//! A [`Snapshot`] is the unit of publication: built once per completed poll
//! cycle and swapped in whole. Readers never see repositories from two
//! different cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::FetchError;
use crate::domain::run::{RunStatus, WorkflowRun};
use crate::domain::target::WatchTarget;

/// Result of polling one watch target in one cycle
///
/// Either `runs` holds the fetched runs and `last_error` is `None`, or the
/// fetch failed and `runs` is empty. A failed cycle never keeps stale runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub owner: String,
    pub repository: String,
    pub runs: Vec<WorkflowRun>,
    pub last_error: Option<FetchError>,
    pub last_polled_at: DateTime<Utc>,
}

impl RepositorySnapshot {
    /// Snapshot of a successful fetch
    pub fn fetched(target: &WatchTarget, runs: Vec<WorkflowRun>, polled_at: DateTime<Utc>) -> Self {
        Self {
            owner: target.owner.clone(),
            repository: target.repository.clone(),
            runs,
            last_error: None,
            last_polled_at: polled_at,
        }
    }

    /// Snapshot of a failed fetch
    pub fn failed(target: &WatchTarget, error: FetchError, polled_at: DateTime<Utc>) -> Self {
        Self {
            owner: target.owner.clone(),
            repository: target.repository.clone(),
            runs: Vec::new(),
            last_error: Some(error),
            last_polled_at: polled_at,
        }
    }

    pub fn from_result(
        target: &WatchTarget,
        result: Result<Vec<WorkflowRun>, FetchError>,
        polled_at: DateTime<Utc>,
    ) -> Self {
        match result {
            Ok(runs) => Self::fetched(target, runs, polled_at),
            Err(error) => Self::failed(target, error, polled_at),
        }
    }

    /// `owner/repository`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Status of the most recent run (providers list newest first)
    pub fn latest_status(&self) -> Option<RunStatus> {
        self.runs.first().map(|run| run.status)
    }

    /// Whether the repository needs attention: the fetch failed or the most
    /// recent run failed
    pub fn is_failing(&self) -> bool {
        self.last_error.is_some() || self.latest_status() == Some(RunStatus::Failure)
    }
}

/// Reconciled view of every watch target after one poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of the cycle that produced this snapshot; 0 before the first
    /// cycle completes
    pub generation: u64,

    /// One entry per watch target, in watch-list order
    pub repositories: Vec<RepositorySnapshot>,

    pub generated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        generation: u64,
        repositories: Vec<RepositorySnapshot>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generation,
            repositories,
            generated_at,
        }
    }

    /// The empty snapshot readers see until the first cycle is published
    pub fn initial() -> Self {
        Self::new(0, Vec::new(), Utc::now())
    }

    /// Whether at least one cycle has been published
    pub fn is_populated(&self) -> bool {
        self.generation > 0
    }

    /// Number of repositories whose fetch failed
    pub fn error_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|repo| repo.last_error.is_some())
            .count()
    }

    /// Number of repositories that need attention
    pub fn failing_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|repo| repo.is_failing())
            .count()
    }

    /// First repository matching `owner/repository`
    pub fn find(&self, owner: &str, repository: &str) -> Option<&RepositorySnapshot> {
        self.repositories
            .iter()
            .find(|repo| repo.owner == owner && repo.repository == repository)
    }
}
