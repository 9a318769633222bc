//! Materialization: turning a resolved job into files on disk and a queued job.

pub mod launcher;
pub mod materialize;

pub use launcher::{CommandLauncher, Launcher};
pub use materialize::{Materialized, materialize, preview};
