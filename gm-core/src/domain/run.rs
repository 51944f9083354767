//! Workflow run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, provider-independent status of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Queued or waiting for a runner
    Pending,

    /// Currently executing
    Running,

    Success,
    Failure,
    Cancelled,
}

impl RunStatus {
    /// Single-glyph indicator used by the dashboard
    pub fn symbol(&self) -> &'static str {
        match self {
            RunStatus::Success => "✓",
            RunStatus::Failure => "✗",
            RunStatus::Running => "⟳",
            RunStatus::Pending => "◯",
            RunStatus::Cancelled => "⊘",
        }
    }

    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failure | RunStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failure => write!(f, "failure"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One execution of a workflow
///
/// `updated_at` always comes from the provider's own timestamp, never from
/// the local clock at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub name: String,
    pub status: RunStatus,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn new(name: impl Into<String>, status: RunStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status,
            updated_at,
        }
    }
}
