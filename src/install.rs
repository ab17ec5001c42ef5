//! Optional installation of pinned tool versions.
//!
//! The action image ships with the GitHub CLI and iFlow CLI preinstalled;
//! these helpers replace them with a requested version.

use crate::error::{ActionError, Result};
use crate::exec::shell::run_checked;
use crate::exec::{Echo, Invocation, ProcessRunner};
use std::time::Duration;
use tracing::{info, warn};

/// Package name of the iFlow CLI on npm.
pub const IFLOW_NPM_PACKAGE: &str = "@iflow-ai/iflow-cli";

/// Check a version string before it is interpolated into a shell line.
pub fn validate_version(tool: &str, version: &str) -> Result<()> {
    let ok = !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'));
    if ok {
        Ok(())
    } else {
        Err(ActionError::UserError(format!(
            "invalid {} version '{}': only letters, digits, '.', '-' and '+' are allowed",
            tool, version
        )))
    }
}

/// Shell pipeline that installs GitHub CLI `version` into `/usr/local/bin`.
pub fn gh_install_script(version: &str) -> String {
    let dir = format!("gh_{}_linux_amd64", version);
    format!(
        "curl -fsSL https://github.com/cli/cli/releases/download/v{v}/{d}.tar.gz | tar xz \
         && sudo cp {d}/bin/gh /usr/local/bin/ && rm -rf {d}",
        v = version,
        d = dir
    )
}

/// Install the requested GitHub CLI version.
pub fn install_gh(version: &str) -> Result<()> {
    validate_version("GitHub CLI", version)?;
    info!(version, "installing GitHub CLI");
    run_checked(
        "sh",
        &["-c", &gh_install_script(version)],
        &format!("install GitHub CLI version {}", version),
    )?;
    Ok(())
}

/// Install the requested iFlow CLI version globally with npm.
pub fn install_iflow(version: &str) -> Result<()> {
    validate_version("iFlow CLI", version)?;
    info!(version, "installing iFlow CLI");
    let package = format!("{}@{}", IFLOW_NPM_PACKAGE, version);
    run_checked(
        "npm",
        &["install", "-g", &package],
        &format!("install iFlow CLI version {}", version),
    )?;
    Ok(())
}

/// How long `--version` may take before the probe gives up.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// `<program> --version`, trimmed; `None` if the CLI cannot report it
/// within `timeout`.
pub fn probe_version(program: &str, timeout: Duration) -> Option<String> {
    let invocation = match Invocation::new(program, timeout) {
        Ok(invocation) => invocation.with_args(["--version"]),
        Err(e) => {
            warn!(error = %e, "iFlow CLI version probe not started");
            return None;
        }
    };

    let outcome = ProcessRunner::new().with_echo(Echo::Silent).run(&invocation);
    if outcome.is_success() {
        return Some(outcome.captured.trim().to_string());
    }

    match &outcome.error {
        Some(e) => warn!(error = %e, "iFlow CLI version probe failed"),
        None => warn!(exit_code = outcome.exit_code, "iFlow CLI version probe failed"),
    }
    None
}
