//! Exit code constants for iflow-action.
//!
//! - 0: the iFlow CLI completed and exited cleanly
//! - 1: configuration/setup failure, or the CLI could not be started or waited on
//! - 124: the CLI exceeded its timeout
//!
//! Any other code is the iFlow CLI's own exit status, propagated verbatim.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Generic failure: bad configuration, setup error, spawn or wait failure.
pub const FAILURE: i32 = 1;

/// The command was killed after exceeding its deadline (matches `timeout(1)`).
pub const TIMEOUT: i32 = 124;

/// Offset added to a signal number when a child is killed by a signal.
pub const SIGNAL_BASE: i32 = 128;
