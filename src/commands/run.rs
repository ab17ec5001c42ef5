//! Implementation of the top-level run.
//!
//! # What a run does
//!
//! 1. Reports the preinstalled iFlow CLI version (best effort)
//! 2. Resolves the configuration from flags and, in Actions mode, `INPUT_*`
//! 3. Validates it
//! 4. Installs pinned GitHub CLI / iFlow CLI versions if requested
//! 5. Resolves the working directory (the process itself never changes directory)
//! 6. Writes `~/.iflow/settings.json`
//! 7. Runs the pre-command lines
//! 8. Runs `iflow --yolo --prompt <prompt> <extra args...>` under the deadline
//! 9. Publishes the outcome as step outputs, console text and a step summary
//!
//! A non-zero exit of the iFlow CLI becomes an error carrying that exit code,
//! so the process exits with it.

use crate::actions::Reporter;
use crate::cli::Cli;
use crate::config::{Config, Mode};
use crate::error::{ActionError, Result};
use crate::exec::shell::run_precmd;
use crate::exec::{Invocation, Outcome, ProcessRunner, RunError, tokenize};
use crate::install;
use crate::settings;
use crate::summary::render_summary;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Program name of the iFlow CLI.
pub const IFLOW_PROGRAM: &str = "iflow";

/// Where a run finds its tools and writes its settings.
#[derive(Debug, Clone)]
pub struct Session {
    pub program: String,
    pub home: PathBuf,
    pub runner: ProcessRunner,
    /// Time limit for `<program> --version`.
    pub version_probe_timeout: Duration,
}

impl Session {
    /// Session for the real environment: `iflow` on `PATH`, the user's home.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            program: IFLOW_PROGRAM.to_string(),
            home: settings::home_dir()?,
            runner: ProcessRunner::new(),
            version_probe_timeout: install::VERSION_PROBE_TIMEOUT,
        })
    }
}

/// Execute the run against the real process environment.
pub fn cmd_run(cli: &Cli) -> Result<()> {
    let env = |key: &str| std::env::var(key).ok();
    let mode = Mode::detect(cli.use_env_vars, env);
    let reporter = Reporter::from_env(mode, env);

    let result = Session::from_env().and_then(|session| execute(cli, env, &reporter, &session));

    if let Err(err) = &result
        && reporter.mode().is_actions()
    {
        reporter.error(&err.to_string());
    }
    result
}

/// Execute the run with an injected environment and session.
pub fn execute<F>(cli: &Cli, env: F, reporter: &Reporter, session: &Session) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match install::probe_version(&session.program, session.version_probe_timeout) {
        Some(version) => reporter.notice(&format!("iFlow CLI version: {}", version)),
        None => reporter.notice("Warning: failed to get iFlow CLI version"),
    }

    let config = Config::resolve(cli, &env)?;
    config.validate()?;

    install_pinned_tools(&config, reporter)?;

    let working_dir = resolve_working_dir(&config.working_dir)?;

    reporter.notice("Configuring iFlow settings...");
    let settings_path = settings::write_settings(&config, &session.home)?;
    reporter.notice(&format!(
        "iFlow settings configured at {}",
        settings_path.display()
    ));

    if !config.precmd.is_empty() {
        run_precmd(&config.precmd, &working_dir, |line| {
            reporter.notice(&format!("Executing pre-command: {}", line))
        })?;
    }

    let invocation = build_invocation(&session.program, &config, &working_dir)?;
    reporter.notice(&format!(
        "Executing iFlow CLI prompt with --prompt and --yolo: {}",
        config.prompt
    ));
    reporter.notice(&format!(
        "Command timeout set to: {} seconds",
        config.timeout_secs
    ));
    if !config.extra_args.is_empty() {
        reporter.notice(&format!(
            "Using additional arguments: {:?}",
            &invocation.args()[3..]
        ));
    }

    let outcome = session.runner.run(&invocation);
    info!(
        exit_code = outcome.exit_code,
        timed_out = outcome.timed_out,
        captured = outcome.captured.len(),
        "iFlow CLI finished"
    );

    publish(&config, &outcome, reporter)?;
    if outcome.is_success() {
        reporter.notice("iFlow CLI execution completed successfully");
    }
    into_result(outcome)
}

fn install_pinned_tools(config: &Config, reporter: &Reporter) -> Result<()> {
    if !config.gh_version.is_empty() {
        reporter.notice(&format!(
            "Installing GitHub CLI version: {}",
            config.gh_version
        ));
        install::install_gh(&config.gh_version)?;
        reporter.notice(&format!(
            "Successfully installed GitHub CLI version: {}",
            config.gh_version
        ));
    }

    if !config.iflow_version.is_empty() {
        reporter.notice(&format!(
            "Installing iFlow CLI version: {}",
            config.iflow_version
        ));
        install::install_iflow(&config.iflow_version)?;
        reporter.notice(&format!(
            "Successfully installed iFlow CLI version: {}",
            config.iflow_version
        ));
    }

    Ok(())
}

/// Make `dir` absolute and check that it is an existing directory.
pub fn resolve_working_dir(dir: &Path) -> Result<PathBuf> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| {
                ActionError::SetupError(format!("cannot determine current directory: {}", e))
            })?
            .join(dir)
    };

    match std::fs::metadata(&absolute) {
        Ok(meta) if meta.is_dir() => {
            debug!(dir = %absolute.display(), "working directory resolved");
            Ok(absolute)
        }
        Ok(_) => Err(ActionError::UserError(format!(
            "working directory '{}' is not a directory",
            dir.display()
        ))),
        Err(e) => Err(ActionError::UserError(format!(
            "working directory '{}' is not accessible: {}",
            dir.display(),
            e
        ))),
    }
}

/// `<program> --yolo --prompt <prompt> <extra args...>` in `working_dir`.
pub fn build_invocation(program: &str, config: &Config, working_dir: &Path) -> Result<Invocation> {
    let invocation = Invocation::new(program, config.timeout())?
        .with_args(["--yolo", "--prompt", config.prompt.as_str()])
        .with_args(tokenize(&config.extra_args))
        .with_working_dir(working_dir);
    Ok(invocation)
}

/// Hand the outcome to the runner's output files or the console.
fn publish(config: &Config, outcome: &Outcome, reporter: &Reporter) -> Result<()> {
    for warning in &outcome.warnings {
        reporter.notice(&format!("Warning: {}", warning));
    }

    if reporter.mode().is_actions() {
        reporter.set_output("result", &outcome.captured)?;
        reporter.set_output("exit_code", &outcome.exit_code.to_string())?;
        println!("{}", outcome.captured);

        let markdown = render_summary(config, outcome, Utc::now());
        if let Err(e) = reporter.write_step_summary(&markdown) {
            reporter.notice(&format!("Warning: failed to write step summary: {}", e));
        }
    } else {
        println!("Exit Code: {}", outcome.exit_code);
        println!("Result:\n{}", outcome.captured);
    }
    Ok(())
}

/// Turn an outcome into the run's final status.
fn into_result(outcome: Outcome) -> Result<()> {
    match outcome.error {
        Some(err @ RunError::Timeout { .. }) => Err(err.into()),
        Some(err) => Err(ActionError::CommandFailed {
            code: outcome.exit_code,
            reason: format!("could not be executed: {}", err),
        }),
        None if outcome.exit_code != 0 => Err(ActionError::CommandFailed {
            code: outcome.exit_code,
            reason: format!("exited with code {}", outcome.exit_code),
        }),
        None => Ok(()),
    }
}
