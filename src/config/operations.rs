//! Config resolution, validation, and utility operations.

use super::model::Config;
use super::types::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS, Mode};
use crate::cli::Cli;
use crate::error::{ActionError, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

impl Config {
    /// Build a config from flags alone.
    pub fn from_cli(cli: &Cli, mode: Mode) -> Self {
        Self {
            mode,
            prompt: cli.prompt.clone(),
            api_key: cli.api_key.clone(),
            settings_json: cli.settings_json.clone(),
            base_url: cli.base_url.clone(),
            model: cli.model.clone(),
            working_dir: PathBuf::from(&cli.working_dir),
            timeout_secs: cli.timeout,
            extra_args: cli.extra_args.clone(),
            precmd: cli.precmd.clone(),
            gh_version: cli.gh_version.clone(),
            iflow_version: cli.iflow_version.clone(),
        }
    }

    /// Resolve the config for this run.
    ///
    /// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
    /// for the real process environment. In GitHub Actions mode every
    /// non-empty `INPUT_*` variable overrides the matching flag.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = Mode::detect(cli.use_env_vars, &env);
        let mut config = Self::from_cli(cli, mode);
        if mode.is_actions() {
            config.apply_inputs(&env)?;
        }
        debug!(mode = %config.mode, "configuration resolved");
        Ok(config)
    }

    /// Overlay GitHub Actions inputs onto this config.
    pub fn apply_inputs<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| get_input(&env, name);

        if let Some(v) = input("prompt") {
            self.prompt = v.trim().to_string();
        }
        if let Some(v) = input("api_key") {
            self.api_key = v;
        }
        if let Some(v) = input("settings_json") {
            self.settings_json = v;
        }
        if let Some(v) = input("base_url") {
            self.base_url = v;
        }
        if let Some(v) = input("model") {
            self.model = v;
        }
        if let Some(v) = input("working_directory") {
            self.working_dir = PathBuf::from(v);
        }
        if let Some(raw) = input("timeout") {
            debug!(raw = %raw, "parsing timeout input");
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                ActionError::UserError(format!(
                    "invalid timeout value: '{}'. Timeout must be a valid integer between {} and {} seconds",
                    raw, MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS
                ))
            })?;
        }
        if let Some(v) = input("extra_args") {
            self.extra_args = v.trim().to_string();
        }
        if let Some(v) = input("precmd") {
            self.precmd = v.trim().to_string();
        }
        if let Some(v) = input("gh_version") {
            self.gh_version = v.trim().to_string();
        }
        if let Some(v) = input("iflow_version") {
            self.iflow_version = v.trim().to_string();
        }

        Ok(())
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `prompt` must be non-empty
    /// - `api_key` or `settings_json` must be provided
    /// - `timeout_secs` must be within 1..=86400
    pub fn validate(&self) -> Result<()> {
        let actions = self.mode.is_actions();

        if self.prompt.is_empty() {
            return Err(ActionError::UserError(if actions {
                "prompt input is required and cannot be empty".to_string()
            } else {
                "prompt is required and cannot be empty".to_string()
            }));
        }

        if self.api_key.is_empty() && self.settings_json.is_empty() {
            return Err(ActionError::UserError(if actions {
                "api_key input is required and cannot be empty".to_string()
            } else {
                "api-key is required when settings-json is not provided".to_string()
            }));
        }

        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ActionError::UserError(format!(
                "timeout value {} is out of range. Timeout must be between {} and {} seconds (24 hours)",
                self.timeout_secs, MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS
            )));
        }

        Ok(())
    }

    /// The timeout as a duration; zero if the config was never validated.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.timeout_secs).unwrap_or(0))
    }
}

/// Look up a GitHub Actions input: `INPUT_<NAME>` with the name upper-cased
/// and dashes turned into underscores. Empty values count as unset.
pub fn get_input<F>(env: F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let key = format!("INPUT_{}", name.replace('-', "_").to_uppercase());
    env(&key).filter(|v| !v.is_empty())
}
