//! Workflow run DTOs
//!
//! Raw run records as a CI provider reports them. Only the fields the
//! monitor consumes are modelled; everything else in the payload is ignored.

use serde::{Deserialize, Serialize};

use crate::domain::run::WorkflowRun;
use crate::normalize::{self, MalformedTimestamp};

/// One run record before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWorkflowRun {
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub updated_at: String,
}

impl RawWorkflowRun {
    /// Converts the record into a domain [`WorkflowRun`]
    pub fn normalize(&self) -> Result<WorkflowRun, MalformedTimestamp> {
        let (status, updated_at) = normalize::normalize(
            &self.status,
            self.conclusion.as_deref(),
            &self.updated_at,
        )?;

        Ok(WorkflowRun {
            name: self.name.clone(),
            status,
            updated_at,
        })
    }
}

/// A page of run records (`GET /repos/{owner}/{repo}/actions/runs`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunsPage {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<RawWorkflowRun>,
}

impl WorkflowRunsPage {
    /// Parses a response body
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Normalizes every record, failing on the first bad one
    ///
    /// A page is converted whole or not at all so a caller never shows a
    /// partial run list without knowing records were lost.
    pub fn into_runs(self) -> Result<Vec<WorkflowRun>, MalformedTimestamp> {
        self.workflow_runs
            .iter()
            .map(RawWorkflowRun::normalize)
            .collect()
    }
}
