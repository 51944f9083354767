//! Data Transfer Objects for provider communication
//!
//! DTOs mirror the JSON a CI provider returns. They are converted into
//! domain types through the normalizer and never reach the snapshot as-is.

pub mod run;
