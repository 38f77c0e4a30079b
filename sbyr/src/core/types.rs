//! Shared result types for one task's run.
//!
//! These types define the stable contract between the job driver and the
//! report emitter. A `RunResult` is created once by the job and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::retcode;

/// Final verdict for one task, mirrored by the sentinel file the engine
/// leaves in the workdir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Unknown,
    Error,
    Timeout,
}

impl Status {
    /// Uppercase label, as used for sentinel files and the `status` record.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Unknown => "UNKNOWN",
            Status::Error => "ERROR",
            Status::Timeout => "TIMEOUT",
        }
    }

    /// Return-code bit contributed by this status.
    pub fn retcode_bit(self) -> i32 {
        match self {
            Status::Pass => retcode::PASS,
            Status::Fail => retcode::FAIL,
            Status::Unknown => retcode::UNKNOWN,
            Status::Error => retcode::ERROR,
            Status::Timeout => retcode::TIMEOUT,
        }
    }

    /// Parse a sentinel file name back into a status.
    pub fn from_sentinel(name: &str) -> Option<Self> {
        match name {
            "PASS" => Some(Status::Pass),
            "FAIL" => Some(Status::Fail),
            "UNKNOWN" => Some(Status::Unknown),
            "ERROR" => Some(Status::Error),
            "TIMEOUT" => Some(Status::Timeout),
            _ => None,
        }
    }
}

/// All sentinel file names, in the order they are probed.
pub const SENTINELS: [&str; 5] = ["PASS", "FAIL", "UNKNOWN", "ERROR", "TIMEOUT"];

/// Outcome of running one task's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Final verdict.
    pub status: Status,
    /// Return-code bits (see [`crate::retcode`]).
    pub retcode: i32,
    /// Elapsed wall time in whole seconds.
    pub elapsed_secs: u64,
    /// Accumulated log text (embedded into the XML report).
    #[serde(skip)]
    pub log: String,
}
