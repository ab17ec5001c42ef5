//! GitHub Actions workflow-command surface.
//!
//! User-facing progress goes to stdout: `::notice::` / `::error::` workflow
//! commands inside Actions, `INFO:` lines otherwise. Step outputs and the
//! step summary go to the files the runner names in `GITHUB_OUTPUT` and
//! `GITHUB_STEP_SUMMARY`.

use crate::config::Mode;
use crate::error::Result;
use crate::fs::append_to_file;
use std::path::PathBuf;
use tracing::debug;

/// Reporter bound to one run's mode and runner files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter {
    mode: Mode,
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl Reporter {
    pub fn new(mode: Mode, output_file: Option<PathBuf>, summary_file: Option<PathBuf>) -> Self {
        Self {
            mode,
            output_file,
            summary_file,
        }
    }

    /// Read `GITHUB_OUTPUT` and `GITHUB_STEP_SUMMARY` through `env`.
    pub fn from_env<F>(mode: Mode, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| env(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self::new(mode, path("GITHUB_OUTPUT"), path("GITHUB_STEP_SUMMARY"))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Print a progress message.
    pub fn notice(&self, message: &str) {
        println!("{}", format_notice(self.mode, message));
    }

    /// Print an error annotation. Never exits; callers propagate the error.
    pub fn error(&self, message: &str) {
        println!("{}", format_error(message));
    }

    /// Publish a step output.
    ///
    /// Uses the multiline `name<<delimiter` file format when `GITHUB_OUTPUT`
    /// is set, and the legacy `::set-output` command otherwise.
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        match &self.output_file {
            Some(path) => {
                debug!(name, path = %path.display(), "writing step output");
                let delimiter = format!("EOF_{}", std::process::id());
                append_to_file(path, &format_output_entry(name, value, &delimiter))
            }
            None => {
                println!("::set-output name={}::{}", name, value);
                Ok(())
            }
        }
    }

    /// Append Markdown to the step summary; a no-op outside Actions.
    pub fn write_step_summary(&self, markdown: &str) -> Result<()> {
        match &self.summary_file {
            Some(path) => append_to_file(path, markdown),
            None => {
                debug!("GITHUB_STEP_SUMMARY not set; skipping step summary");
                Ok(())
            }
        }
    }
}

pub fn format_notice(mode: Mode, message: &str) -> String {
    match mode {
        Mode::GitHubActions => format!("::notice::{}", message),
        Mode::Cli => format!("INFO: {}", message),
    }
}

pub fn format_error(message: &str) -> String {
    format!("::error::{}", message)
}

fn format_output_entry(name: &str, value: &str, delimiter: &str) -> String {
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}
