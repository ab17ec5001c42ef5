//! Failure taxonomy for a single process invocation.

use std::time::Duration;
use thiserror::Error;

/// Why an invocation did not complete cleanly.
///
/// A child that runs to completion with a non-zero status is not represented
/// here; its status is carried by [`Outcome::exit_code`](super::Outcome) alone.
#[derive(Error, Debug)]
pub enum RunError {
    /// The executable could not be started (missing binary, permission denied).
    #[error("failed to start command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The deadline elapsed before the child exited.
    #[error("command timed out after {}", format_timeout(.timeout))]
    Timeout { timeout: Duration },

    /// The child was started but its status could not be collected.
    #[error("failed to wait for command '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An invocation was built with a zero timeout.
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}

/// Render a timeout the way users configure it: whole seconds when possible.
pub(crate) fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{:.3} seconds", timeout.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_uses_whole_seconds() {
        let err = RunError::Timeout {
            timeout: Duration::from_secs(3600),
        };
        assert_eq!(err.to_string(), "command timed out after 3600 seconds");
    }

    #[test]
    fn timeout_message_handles_fractions() {
        let err = RunError::Timeout {
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "command timed out after 0.250 seconds");
        assert_eq!(format_timeout(&Duration::from_secs(1)), "1 seconds");
    }

    #[test]
    fn spawn_message_names_program() {
        let err = RunError::Spawn {
            program: "iflow".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("'iflow'"));
        assert!(err.to_string().contains("not found"));
    }
}
