//! Watch target domain type

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A repository the monitor polls
///
/// Created once from configuration and shared read-only by every poll task.
/// Identity is the `(owner, repository)` pair, but duplicates are allowed and
/// each entry is polled independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchTarget {
    pub owner: String,
    pub repository: String,

    /// Workflow names to keep; an empty filter keeps every workflow
    #[serde(default)]
    pub workflow_filter: BTreeSet<String>,
}

impl WatchTarget {
    /// Creates a target that selects every workflow
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            workflow_filter: BTreeSet::new(),
        }
    }

    /// Restricts the target to the given workflow names
    pub fn with_workflows<I, S>(mut self, workflows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workflow_filter
            .extend(workflows.into_iter().map(Into::into));
        self
    }

    /// Whether a run of `workflow_name` should be shown for this target
    pub fn selects(&self, workflow_name: &str) -> bool {
        self.workflow_filter.is_empty() || self.workflow_filter.contains(workflow_name)
    }
}

impl std::fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repository)
    }
}
