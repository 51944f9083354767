//! Core domain types
//!
//! This module contains the structures shared between the provider client
//! (which produces runs and errors), the monitor (which reconciles them into
//! snapshots) and the terminal front end (which renders them).

pub mod error;
pub mod run;
pub mod snapshot;
pub mod target;
