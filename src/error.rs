//! Error types for the iflow-action CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exec::RunError;
use crate::exit_codes;
use thiserror::Error;

/// Main error type for iflow-action operations.
///
/// Each variant maps to the process exit code `main` returns.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Invalid or missing configuration.
    #[error("{0}")]
    UserError(String),

    /// A step before the iFlow CLI run failed (settings, installs, pre-command).
    #[error("Setup failed: {0}")]
    SetupError(String),

    /// The iFlow CLI ran but did not succeed.
    #[error("iFlow CLI {reason}")]
    CommandFailed { code: i32, reason: String },

    /// The process runner rejected or could not carry out the invocation.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl ActionError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ActionError::UserError(_) => exit_codes::FAILURE,
            ActionError::SetupError(_) => exit_codes::FAILURE,
            ActionError::CommandFailed { code, .. } => *code,
            ActionError::Run(RunError::Timeout { .. }) => exit_codes::TIMEOUT,
            ActionError::Run(_) => exit_codes::FAILURE,
        }
    }
}

/// Result type alias for iflow-action operations.
pub type Result<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = ActionError::UserError("prompt is required".to_string());
        assert_eq!(err.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn setup_error_has_correct_exit_code() {
        let err = ActionError::SetupError("settings".to_string());
        assert_eq!(err.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn command_failed_propagates_child_code() {
        let err = ActionError::CommandFailed {
            code: 42,
            reason: "exited with code 42".to_string(),
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.to_string(), "iFlow CLI exited with code 42");
    }

    #[test]
    fn run_errors_map_to_failure_or_timeout() {
        let err = ActionError::from(RunError::Timeout {
            timeout: Duration::from_secs(5),
        });
        assert_eq!(err.exit_code(), exit_codes::TIMEOUT);

        let err = ActionError::from(RunError::InvalidTimeout);
        assert_eq!(err.exit_code(), exit_codes::FAILURE);
        assert_eq!(err.to_string(), "timeout must be greater than zero");
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ActionError::SetupError("failed to write settings file".to_string());
        assert_eq!(err.to_string(), "Setup failed: failed to write settings file");
    }
}
