//! Side-effecting operations: workdir lifecycle, engine invocation, report
//! emission, and tool configuration. Kept apart from [`crate::core`] so the
//! preprocessing logic stays testable without a filesystem.

pub mod config;
pub mod job;
pub mod process;
pub mod report;
pub mod workdir;
