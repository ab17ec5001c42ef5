//! Config struct definition.

use super::types::Mode;
use std::path::PathBuf;

/// Fully-resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,

    // =========================================================================
    // iFlow settings
    // =========================================================================
    /// Prompt passed to `iflow --prompt`.
    pub prompt: String,

    /// API key, used for both `apiKey` and `searchApiKey`.
    pub api_key: String,

    /// Raw settings JSON; when non-empty it replaces the generated settings.
    pub settings_json: String,

    pub base_url: String,

    pub model: String,

    // =========================================================================
    // Execution settings
    // =========================================================================
    /// Directory the pre-command and the iFlow CLI run in.
    pub working_dir: PathBuf,

    /// Timeout in seconds; only meaningful after [`Config::validate`].
    pub timeout_secs: i64,

    /// Extra arguments for the iFlow CLI, tokenized before use.
    pub extra_args: String,

    /// Newline-separated shell commands run before the iFlow CLI.
    pub precmd: String,

    // =========================================================================
    // Tool versions
    // =========================================================================
    /// GitHub CLI version to install (empty keeps the preinstalled one).
    pub gh_version: String,

    /// iFlow CLI version to install (empty keeps the preinstalled one).
    pub iflow_version: String,
}
