//! Front-end runner for Yosys-based formal verification flows.
//!
//! One `.sby` document declares any number of tasks; this crate resolves a
//! concrete configuration per task, manages each task's working directory,
//! drives one external engine job per task, and persists status and JUnit
//! reports. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (tag matching, preprocessing,
//!   template expansion, task selection). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (workdir lifecycle, engine
//!   processes, reports). Isolated to enable scripted jobs in tests.
//!
//! [`run`] coordinates core logic with I/O to implement the CLI.

pub mod core;
pub mod io;
pub mod logging;
pub mod retcode;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
