//! Contract values passed between callers and the process runner.

use super::error::RunError;
use crate::exit_codes;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A single, fully-resolved child-process call.
///
/// Constructed once and read-only afterwards. The timeout is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl Invocation {
    /// Create an invocation of `program` with no arguments, running in the
    /// current directory.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Result<Self, RunError> {
        if timeout.is_zero() {
            return Err(RunError::InvalidTimeout);
        }
        Ok(Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            timeout,
        })
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shell-quoted rendering of the command line, for log output.
    pub fn display_command(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Result of running one [`Invocation`].
///
/// - `exit_code == 0` exactly when there is no error and no timeout.
/// - A timeout always carries exit code 124 and a [`RunError::Timeout`].
/// - A spawn failure carries exit code 1 and usually no captured text.
/// - A clean non-zero exit carries the child's status and no error.
#[derive(Debug)]
pub struct Outcome {
    /// Interleaved stdout and stderr, in read order per stream.
    pub captured: String,
    pub exit_code: i32,
    pub timed_out: bool,
    pub error: Option<RunError>,
    /// Non-fatal relay failures, one message per affected stream.
    pub warnings: Vec<String>,
}

impl Outcome {
    pub(crate) fn exited(captured: String, exit_code: i32, warnings: Vec<String>) -> Self {
        Self {
            captured,
            exit_code,
            timed_out: false,
            error: None,
            warnings,
        }
    }

    pub(crate) fn timed_out(captured: String, timeout: Duration, warnings: Vec<String>) -> Self {
        Self {
            captured,
            exit_code: exit_codes::TIMEOUT,
            timed_out: true,
            error: Some(RunError::Timeout { timeout }),
            warnings,
        }
    }

    pub(crate) fn failed(captured: String, error: RunError, warnings: Vec<String>) -> Self {
        Self {
            captured,
            exit_code: exit_codes::FAILURE,
            timed_out: false,
            error: Some(error),
            warnings,
        }
    }

    /// Whether the child ran to completion and exited with status 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == exit_codes::SUCCESS && self.error.is_none() && !self.timed_out
    }
}
