//! Sequential shell execution for setup steps.
//!
//! Unlike [`ProcessRunner`](super::ProcessRunner), nothing here is captured
//! or bounded by a deadline: pre-commands are interactive and inherit the
//! caller's standard streams, and tool installs report their own output only
//! when they fail.

use crate::error::{ActionError, Result};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Maximum characters of failed-command output carried into an error.
const ERROR_OUTPUT_MAX_CHARS: usize = 2000;

/// Execute each non-empty line of `precmd` with `sh -c`, in order.
///
/// Standard input, output and error are inherited. The first failing line
/// aborts the sequence.
pub fn run_precmd(precmd: &str, working_dir: &Path, mut announce: impl FnMut(&str)) -> Result<()> {
    for line in precmd.lines().map(str::trim).filter(|l| !l.is_empty()) {
        announce(line);
        debug!(command = line, dir = %working_dir.display(), "running pre-command");

        let status = Command::new("sh")
            .arg("-c")
            .arg(line)
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                ActionError::SetupError(format!(
                    "pre-command '{}' could not be started: {}",
                    line, e
                ))
            })?;

        if !status.success() {
            return Err(ActionError::SetupError(format!(
                "pre-command '{}' failed: {}",
                line, status
            )));
        }
    }

    Ok(())
}

/// Run `program` with `args`, capturing output, and fail with that output
/// attached if it exits unsuccessfully.
pub fn run_checked(program: &str, args: &[&str], what: &str) -> Result<Output> {
    debug!(program, ?args, "running helper command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            ActionError::SetupError(format!(
                "failed to {}: could not run '{}': {}",
                what, program, e
            ))
        })?;

    if output.status.success() {
        return Ok(output);
    }

    let mut msg = format!("failed to {}: {}", what, output.status);
    let combined = combined_output(&output);
    let combined = combined.trim();
    if !combined.is_empty() {
        msg.push_str("\nOutput:\n");
        msg.push_str(tail_chars(combined, ERROR_OUTPUT_MAX_CHARS));
    }
    Err(ActionError::SetupError(msg))
}

/// stdout followed by stderr, lossily decoded.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// The last `max` characters of `text`.
fn tail_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let skip = count - max;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[start..]
}
