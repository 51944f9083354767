//! Keyboard input
//!
//! Reads commands line by line from stdin on a background task. The
//! terminal stays in cooked mode, so `r` and `q` take effect on Enter and
//! the dashboard header says so.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A user request from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Quit,
}

/// Parse one input line; unknown input is ignored
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "refresh" => Some(Command::Refresh),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Spawn the stdin reader
///
/// The channel closes when stdin reaches end of file.
pub fn spawn_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    None => debug!("Ignoring input {:?}", line),
                },
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    rx
}
