//! Return-code bit flags shared by jobs, reports, and the process exit status.
//!
//! Each task contributes one return code; the process exits with the bitwise
//! OR of all of them, so `0` means every task fully passed and each non-zero
//! bit survives aggregation.

/// Task passed.
pub const PASS: i32 = 0;
/// A property failed (counterexample found).
pub const FAIL: i32 = 2;
/// The engine could not reach a verdict.
pub const UNKNOWN: i32 = 4;
/// The engine hit its own time limit.
pub const TIMEOUT: i32 = 8;
/// Internal error in the engine or its invocation.
pub const ERROR: i32 = 16;

/// Fold per-task return codes into the process exit status.
pub fn aggregate(codes: impl IntoIterator<Item = i32>) -> i32 {
    codes.into_iter().fold(0, |acc, code| acc | code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_is_bitwise_or() {
        assert_eq!(aggregate([0, 2]), 2);
        assert_eq!(aggregate([1, 2]), 3);
        assert_eq!(aggregate([PASS, FAIL, TIMEOUT]), 10);
        assert_eq!(aggregate([]), 0);
    }
}
