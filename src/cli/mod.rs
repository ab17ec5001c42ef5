//! CLI argument parsing for iflow-action.
//!
//! Uses clap derive macros for declarative argument definitions. In GitHub
//! Actions mode most of these are overridden by `INPUT_*` variables; see
//! [`crate::config`].

use clap::{Parser, ValueEnum};

/// Default iFlow API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://apis.iflow.cn/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "Qwen3-Coder";

/// Default timeout in seconds (one hour).
pub const DEFAULT_TIMEOUT_SECS: i64 = 3600;

/// iFlow CLI Action wrapper.
///
/// Configures the iFlow CLI and runs a single prompt with a bounded time
/// budget, streaming its output live and reporting the result.
///
/// Runs in two modes:
/// 1. GitHub Actions mode: configuration comes from `INPUT_*` variables
/// 2. CLI mode: configuration comes from the flags below
#[derive(Parser, Debug, Clone)]
#[command(name = "iflow-action")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The prompt to send to iFlow CLI (required in CLI mode).
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// API key for iFlow authentication.
    #[arg(long, default_value = "")]
    pub api_key: String,

    /// Complete settings JSON configuration (replaces the generated settings).
    #[arg(long, default_value = "")]
    pub settings_json: String,

    /// Base URL for the iFlow API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model name to use.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Working directory for execution.
    #[arg(long = "working-directory", default_value = ".")]
    pub working_dir: String,

    /// Timeout in seconds (1-86400).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, allow_negative_numbers = true)]
    pub timeout: i64,

    /// Additional command line arguments to pass to iFlow CLI.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub extra_args: String,

    /// Shell command(s) to execute before running iFlow CLI, one per line.
    #[arg(long, default_value = "")]
    pub precmd: String,

    /// Version of GitHub CLI to install.
    #[arg(long, default_value = "")]
    pub gh_version: String,

    /// Version of iFlow CLI to install.
    #[arg(long, default_value = "")]
    pub iflow_version: String,

    /// Use environment variables for configuration (GitHub Actions mode).
    #[arg(long)]
    pub use_env_vars: bool,

    /// Logging level for diagnostics on stderr.
    ///
    /// If omitted, `IFLOW_ACTION_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
