//! Configuration types and limits for iflow-action.

use std::fmt;

/// Smallest accepted timeout, in seconds.
pub const MIN_TIMEOUT_SECS: i64 = 1;

/// Largest accepted timeout, in seconds (24 hours).
pub const MAX_TIMEOUT_SECS: i64 = 86_400;

/// Where configuration comes from and how results are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Flags only; plain `INFO:` lines and a printed result.
    #[default]
    Cli,
    /// `INPUT_*` variables override flags; workflow commands, step outputs
    /// and a step summary are emitted.
    GitHubActions,
}

impl Mode {
    /// Pick the mode from the `--use-env-vars` flag and the `GITHUB_ACTIONS`
    /// variable.
    pub fn detect<F>(use_env_vars: bool, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if use_env_vars || env("GITHUB_ACTIONS").as_deref() == Some("true") {
            Mode::GitHubActions
        } else {
            Mode::Cli
        }
    }

    pub fn is_actions(self) -> bool {
        self == Mode::GitHubActions
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Cli => f.write_str("cli"),
            Mode::GitHubActions => f.write_str("github-actions"),
        }
    }
}
