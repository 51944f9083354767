//! gm core
//!
//! Core types and abstractions for the gm workflow monitor.
//!
//! This crate contains:
//! - Domain types: watch targets, workflow runs, snapshots and fetch errors
//! - DTOs: raw run records as a CI provider reports them
//! - Normalization of provider states into the canonical run status
//! - Relative time formatting shared by every display

pub mod domain;
pub mod dto;
pub mod format;
pub mod normalize;
