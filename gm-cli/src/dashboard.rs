//! Interactive dashboard loop
//!
//! Redraws on every published snapshot and once a second for the countdown,
//! and forwards keyboard commands to the scheduler.

use anyhow::{Context, Result};
use chrono::Utc;
use gm_monitor::MonitorHandle;
use std::io::Write;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::input::{self, Command};
use crate::render;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const BELL: &str = "\x07";

/// Run the dashboard until the user quits
///
/// # Arguments
/// * `handle` - The running scheduler
/// * `notifications` - Ring the bell when a repository starts failing
pub async fn run(handle: MonitorHandle, notifications: bool) -> Result<()> {
    let mut updates = handle.subscribe();
    let mut commands = input::spawn_reader();
    let mut stdin_open = true;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut previous = handle.current();

    loop {
        let mut bell = false;

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            command = commands.recv(), if stdin_open => match command {
                Some(Command::Refresh) => handle.request_refresh(),
                Some(Command::Quit) => break,
                None => stdin_open = false,
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                let failing = render::newly_failing(&previous, &current);
                if !failing.is_empty() {
                    info!("Now failing: {}", failing.join(", "));
                    bell = notifications;
                }
                previous = current;
            }
            _ = ticker.tick() => {}
        }

        let frame = render::render(
            &handle.current(),
            Utc::now(),
            Some(handle.seconds_until_next_poll()),
        );
        draw(&frame, bell)?;
    }

    handle.request_quit();
    handle.join().await;
    Ok(())
}

fn draw(frame: &str, bell: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}{}", CLEAR_SCREEN, frame).context("Failed to write to terminal")?;
    if bell {
        write!(stdout, "{}", BELL).context("Failed to write to terminal")?;
    }
    stdout.flush().context("Failed to flush terminal")?;
    Ok(())
}
