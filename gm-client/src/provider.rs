//! Provider abstraction
//!
//! The monitor only needs "a list of normalized runs for this target, or a
//! typed failure". Anything that can answer that, a different CI service or a
//! test double, plugs in behind [`CiProvider`].

use async_trait::async_trait;
use gm_core::domain::error::FetchError;
use gm_core::domain::run::WorkflowRun;
use gm_core::domain::target::WatchTarget;

use crate::GitHubClient;

/// Source of workflow runs for a watch target
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// Fetches the most recent runs of `target`
    ///
    /// Implementations make a single attempt, bounded by their own timeouts,
    /// and apply the target's workflow filter. Retrying is the caller's
    /// business.
    async fn fetch_runs(&self, target: &WatchTarget) -> Result<Vec<WorkflowRun>, FetchError>;
}

#[async_trait]
impl CiProvider for GitHubClient {
    async fn fetch_runs(&self, target: &WatchTarget) -> Result<Vec<WorkflowRun>, FetchError> {
        self.fetch_workflow_runs(target).await
    }
}
