//! Dashboard rendering
//!
//! Turns a snapshot into the text of one dashboard frame. Rendering is pure:
//! the clock reading and the countdown are passed in, so a frame can be
//! checked in tests without a terminal.

use chrono::{DateTime, Utc};
use colored::*;
use gm_core::domain::run::{RunStatus, WorkflowRun};
use gm_core::domain::snapshot::{RepositorySnapshot, Snapshot};
use gm_core::format::{countdown, time_ago};
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 64;
const STATUS_WIDTH: usize = 12;
const MAX_NAME_WIDTH: usize = 40;

fn status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Success => Color::Green,
        RunStatus::Failure => Color::Red,
        RunStatus::Running => Color::Yellow,
        RunStatus::Pending => Color::White,
        RunStatus::Cancelled => Color::BrightBlack,
    }
}

/// Render one frame
///
/// # Arguments
/// * `snapshot` - The view to draw
/// * `now` - Clock reading used for every relative time on the frame
/// * `next_poll` - Seconds until the next cycle, `Some(0)` while one is
///   running, or `None` when no further cycle is scheduled
pub fn render(snapshot: &Snapshot, now: DateTime<Utc>, next_poll: Option<u64>) -> String {
    let mut out = String::new();
    write_frame(&mut out, snapshot, now, next_poll).expect("writing to a String cannot fail");
    out
}

fn write_frame(
    out: &mut String,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    next_poll: Option<u64>,
) -> fmt::Result {
    let rule = "─".repeat(RULE_WIDTH);

    let updated = if snapshot.is_populated() {
        time_ago(snapshot.generated_at, now)
    } else {
        "never".to_string()
    };
    // Input is line-based, so each key needs Enter
    writeln!(
        out,
        "{}  ↻ Last updated: {}  {}  {}",
        "Git Monitor".bold(),
        updated,
        "[r⏎] Refresh".dimmed(),
        "[q⏎] Quit".dimmed()
    )?;
    writeln!(out, "{}", rule)?;

    if !snapshot.is_populated() {
        writeln!(out, "{}", "Waiting for the first poll...".dimmed())?;
    } else if snapshot.repositories.is_empty() {
        writeln!(out, "{}", "No repositories configured.".dimmed())?;
    } else {
        let name_width = name_column_width(snapshot);
        for repo in &snapshot.repositories {
            write_repository(out, repo, name_width, now)?;
            writeln!(out)?;
        }
    }

    writeln!(out, "{}", rule)?;
    write_footer(out, snapshot, next_poll)
}

fn write_footer(out: &mut String, snapshot: &Snapshot, next_poll: Option<u64>) -> fmt::Result {
    write!(out, "Watching {} repos", snapshot.repositories.len())?;

    if snapshot.error_count() > 0 {
        let failed = format!("{} failed to update", snapshot.error_count());
        write!(out, "  {}", failed.red())?;
    }

    match next_poll {
        Some(0) => write!(out, "  {}", "Polling...".dimmed())?,
        Some(seconds) => {
            let label = format!("Next poll: {}", countdown(seconds));
            write!(out, "  {}", label.dimmed())?
        }
        None => {}
    }

    writeln!(out)
}

fn name_column_width(snapshot: &Snapshot) -> usize {
    snapshot
        .repositories
        .iter()
        .flat_map(|repo| repo.runs.iter())
        .map(|run| run.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH)
}

fn write_repository(
    out: &mut String,
    repo: &RepositorySnapshot,
    name_width: usize,
    now: DateTime<Utc>,
) -> fmt::Result {
    writeln!(out, "{}", repo.full_name().bold())?;

    if let Some(error) = &repo.last_error {
        return writeln!(out, "└─ {}", format!("✗ {}", error).red());
    }

    if repo.runs.is_empty() {
        return writeln!(out, "└─ {}", "no workflow runs".dimmed());
    }

    for (i, run) in repo.runs.iter().enumerate() {
        let prefix = if i + 1 == repo.runs.len() {
            "└─ ● "
        } else {
            "├─ ● "
        };
        writeln!(out, "{}{}", prefix, run_line(run, name_width, now))?;
    }

    Ok(())
}

fn run_line(run: &WorkflowRun, name_width: usize, now: DateTime<Utc>) -> String {
    let name: String = run.name.chars().take(MAX_NAME_WIDTH).collect();
    let status = format!("{} {}", run.status.symbol(), run.status);

    format!(
        "{:<name_width$}  {}  {}",
        name,
        format!("{:<STATUS_WIDTH$}", status).color(status_color(run.status)),
        format!("{:>10}", time_ago(run.updated_at, now)).dimmed()
    )
}

/// Repositories whose latest run turned to failure between two snapshots
///
/// Nothing is reported for the first snapshot, since there is no earlier
/// state to compare with.
pub fn newly_failing(previous: &Snapshot, current: &Snapshot) -> Vec<String> {
    if !previous.is_populated() {
        return Vec::new();
    }

    current
        .repositories
        .iter()
        .filter(|repo| repo.latest_status() == Some(RunStatus::Failure))
        .filter(|repo| {
            // A failed fetch says nothing about the runs; keep the last
            // known status
            previous
                .find(&repo.owner, &repo.repository)
                .is_none_or(|before| {
                    before.last_error.is_none()
                        && before.latest_status() != Some(RunStatus::Failure)
                })
        })
        .map(|repo| repo.full_name())
        .collect()
}
