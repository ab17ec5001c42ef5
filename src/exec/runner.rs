//! Deadline-bound process execution.
//!
//! Spawns one child with piped stdout/stderr and a closed stdin, relays its
//! output through an [`OutputStreamer`], and classifies how it ended. On Unix
//! the child leads its own process group so a timeout can take down every
//! descendant, not just the direct child.

use super::error::RunError;
use super::invocation::{Invocation, Outcome};
use super::streamer::{OutputStreamer, Stream, Streamed};
use crate::exit_codes;
use std::io::{self, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the runner checks whether the child has exited.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long the process group has to exit after SIGTERM before SIGKILL.
pub const TERM_GRACE: Duration = Duration::from_millis(500);

/// How long relays may keep draining after the child exited or was killed.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Where relayed output is echoed besides the capture buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Echo {
    /// Mirror child stdout/stderr onto this process's stdout/stderr.
    #[default]
    Console,
    /// Capture only.
    Silent,
}

impl Echo {
    fn writer(self, stream: Stream) -> Box<dyn Write + Send> {
        match (self, stream) {
            (Echo::Console, Stream::Stdout) => Box::new(io::stdout()),
            (Echo::Console, Stream::Stderr) => Box::new(io::stderr()),
            (Echo::Silent, _) => Box::new(io::sink()),
        }
    }
}

/// How the wait on the child ended.
enum Termination {
    Exited(ExitStatus),
    DeadlineElapsed,
    WaitFailed(io::Error),
}

/// Runs invocations one at a time.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    echo: Echo,
    poll_interval: Duration,
    drain_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            echo: Echo::Console,
            poll_interval: POLL_INTERVAL,
            drain_grace: DRAIN_GRACE,
        }
    }

    pub fn with_echo(mut self, echo: Echo) -> Self {
        self.echo = echo;
        self
    }

    #[cfg(test)]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Run `invocation` to completion or until its deadline.
    ///
    /// Never fails outright: spawn, wait and timeout failures are reported
    /// through the returned [`Outcome`], along with any output captured
    /// before the failure.
    pub fn run(&self, invocation: &Invocation) -> Outcome {
        let deadline = Instant::now() + invocation.timeout();

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut command);

        debug!(
            command = %invocation.display_command(),
            dir = %invocation.working_dir().display(),
            timeout_secs = invocation.timeout().as_secs_f64(),
            "spawning child process"
        );

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(program = invocation.program(), error = %source, "spawn failed");
                return Outcome::failed(
                    String::new(),
                    RunError::Spawn {
                        program: invocation.program().to_string(),
                        source,
                    },
                    Vec::new(),
                );
            }
        };

        let mut streamer = OutputStreamer::new();
        if let Some(stdout) = child.stdout.take() {
            streamer.relay(Stream::Stdout, stdout, self.echo.writer(Stream::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            streamer.relay(Stream::Stderr, stderr, self.echo.writer(Stream::Stderr));
        }

        match self.wait_with_deadline(&mut child, deadline) {
            Termination::Exited(status) => {
                let code = exit_code_of(status);
                debug!(pid = child.id(), exit_code = code, "child exited");

                // Descendants may still hold the pipes open; they get the drain
                // grace (never past the deadline) and are killed with the group.
                let drain_until = deadline.min(Instant::now() + self.drain_grace);
                let streamed = if streamer.wait_until(drain_until) {
                    streamer.finish(None)
                } else {
                    warn!(
                        pid = child.id(),
                        "output still open after child exit; killing process group"
                    );
                    signal_process_group(&child, GroupSignal::Kill);
                    let mut streamed = streamer.finish(Some(self.drain_grace));
                    streamed.warnings.push(
                        "descendant processes kept output open after the command exited and were killed"
                            .to_string(),
                    );
                    streamed
                };
                Outcome::exited(streamed.captured, code, streamed.warnings)
            }
            Termination::DeadlineElapsed => {
                info!(
                    pid = child.id(),
                    timeout_secs = invocation.timeout().as_secs_f64(),
                    "deadline elapsed; terminating process group"
                );
                terminate(&mut child);
                let Streamed { captured, warnings } = streamer.finish(Some(self.drain_grace));
                Outcome::timed_out(captured, invocation.timeout(), warnings)
            }
            Termination::WaitFailed(source) => {
                warn!(pid = child.id(), error = %source, "failed to wait on child");
                terminate(&mut child);
                let Streamed { captured, warnings } = streamer.finish(Some(self.drain_grace));
                Outcome::failed(
                    captured,
                    RunError::Wait {
                        program: invocation.program().to_string(),
                        source,
                    },
                    warnings,
                )
            }
        }
    }

    fn wait_with_deadline(&self, child: &mut Child, deadline: Instant) -> Termination {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Termination::Exited(status),
                Ok(None) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Termination::DeadlineElapsed;
                    }
                    std::thread::sleep(self.poll_interval.min(deadline - now));
                }
                Err(e) => return Termination::WaitFailed(e),
            }
        }
    }
}

/// Map an exit status to a shell-style exit code.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return exit_codes::SIGNAL_BASE + signal;
        }
    }

    exit_codes::FAILURE
}

/// Stop the child and its process group, then reap it.
///
/// The group gets SIGTERM first so the child can flush its output, and
/// SIGKILL once [`TERM_GRACE`] has passed.
fn terminate(child: &mut Child) {
    signal_process_group(child, GroupSignal::Term);

    let grace_end = Instant::now() + TERM_GRACE;
    while Instant::now() < grace_end {
        match child.try_wait() {
            Ok(Some(_)) | Err(_) => break,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
        }
    }

    // Descendants that ignored SIGTERM are still in the group.
    signal_process_group(child, GroupSignal::Kill);
    let _ = child.kill();
    if let Err(e) = child.wait() {
        warn!(pid = child.id(), error = %e, "failed to reap killed child");
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Term,
    Kill,
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

#[cfg(unix)]
fn signal_process_group(child: &Child, signal: GroupSignal) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(child.id()) else {
        warn!(pid = child.id(), "pid out of range; cannot signal process group");
        return;
    };
    let signal = match signal {
        GroupSignal::Term => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };

    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) => debug!(pgid = raw, %signal, "signalled process group"),
        // Every member already exited.
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = raw, %signal, error = %e, "failed to signal process group"),
    }
}

#[cfg(not(unix))]
fn signal_process_group(_child: &Child, _signal: GroupSignal) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn quiet() -> ProcessRunner {
        ProcessRunner::new().with_echo(Echo::Silent)
    }

    fn sh(script: &str, timeout: Duration) -> Invocation {
        Invocation::new("sh", timeout)
            .unwrap()
            .with_args(["-c", script])
    }

    #[test]
    fn successful_command_captures_output() {
        let outcome = quiet().run(&sh("echo hi", Duration::from_secs(10)));

        assert_eq!(outcome.exit_code, 0);
        assert!(!outcome.timed_out);
        assert!(outcome.error.is_none());
        assert!(outcome.captured.contains("hi"));
        assert!(outcome.is_success());
    }

    #[test]
    fn nonzero_exit_is_propagated_without_error() {
        let outcome = quiet().run(&sh("echo failing >&2; exit 7", Duration::from_secs(10)));

        assert_eq!(outcome.exit_code, 7);
        assert!(!outcome.timed_out);
        assert!(outcome.error.is_none());
        assert!(outcome.captured.contains("failing"));
    }

    #[test]
    #[serial]
    fn timeout_kills_child_and_keeps_partial_output() {
        let start = Instant::now();
        let outcome = quiet().run(&sh("echo before; sleep 30", Duration::from_secs(1)));

        assert_eq!(outcome.exit_code, 124);
        assert!(outcome.timed_out);
        assert!(matches!(outcome.error, Some(RunError::Timeout { .. })));
        assert!(outcome.captured.contains("before"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn timeout_message_names_configured_seconds() {
        let outcome = quiet().run(&sh("sleep 30", Duration::from_secs(1)));
        let err = outcome.error.unwrap().to_string();
        assert_eq!(err, "command timed out after 1 seconds");
    }

    #[test]
    #[serial]
    fn timeout_kills_descendants_holding_pipes() {
        let start = Instant::now();
        let outcome = quiet().run(&sh("sleep 30 & sleep 30; wait", Duration::from_secs(1)));

        assert!(outcome.timed_out);
        // The backgrounded sleep shares the pipes; it must die with the group
        // for the relays to reach end-of-stream.
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn background_process_outliving_child_is_cut_after_drain_grace() {
        let start = Instant::now();
        let outcome = quiet()
            .with_drain_grace(Duration::from_millis(500))
            .run(&sh("echo started; sleep 30 &", Duration::from_secs(20)));

        assert_eq!(outcome.exit_code, 0);
        assert!(!outcome.timed_out);
        assert!(outcome.captured.contains("started"));
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| w.contains("kept output open after the command exited"))
        );
        // Well before the 20 second deadline.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn timeout_sends_sigterm_before_sigkill() {
        let script = "trap 'echo flushed; exit 0' TERM; echo started; sleep 30 & wait";
        let outcome = quiet().run(&sh(script, Duration::from_secs(1)));

        assert!(outcome.timed_out);
        assert_eq!(outcome.exit_code, 124);
        assert!(outcome.captured.contains("started"));
        assert!(outcome.captured.contains("flushed"), "{:?}", outcome.captured);
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let inv = Invocation::new("nonexistent_command_xyz_123", Duration::from_secs(5)).unwrap();
        let outcome = quiet().run(&inv);

        assert_eq!(outcome.exit_code, 1);
        assert!(!outcome.timed_out);
        assert!(matches!(outcome.error, Some(RunError::Spawn { .. })));
        assert!(outcome.captured.is_empty());
    }

    #[test]
    fn missing_working_dir_is_spawn_failure() {
        let inv = sh("true", Duration::from_secs(5)).with_working_dir("/nonexistent/dir/xyz");
        let outcome = quiet().run(&inv);

        assert_eq!(outcome.exit_code, 1);
        assert!(matches!(outcome.error, Some(RunError::Spawn { .. })));
    }

    #[test]
    fn runs_in_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        let inv = sh("echo x > marker.txt", Duration::from_secs(10)).with_working_dir(temp_dir.path());
        let outcome = quiet().run(&inv);

        assert!(outcome.is_success());
        assert!(temp_dir.path().join("marker.txt").exists());
    }

    #[test]
    fn stdin_is_closed() {
        // `cat` would block forever on an inherited terminal.
        let outcome = quiet().run(&sh("cat; echo after-cat", Duration::from_secs(10)));

        assert!(outcome.is_success());
        assert!(outcome.captured.contains("after-cat"));
    }

    #[test]
    fn signal_death_maps_to_shell_convention() {
        let outcome = quiet().run(&sh("kill -9 $$", Duration::from_secs(10)));

        assert_eq!(outcome.exit_code, 128 + 9);
        assert!(!outcome.timed_out);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn interleaved_streams_are_captured_exactly_once() {
        let script = "i=0; while [ $i -lt 200 ]; do echo out-$i; echo err-$i >&2; i=$((i+1)); done";
        let outcome = quiet().run(&sh(script, Duration::from_secs(20)));

        assert!(outcome.is_success());
        for i in 0..200 {
            for prefix in ["out", "err"] {
                let line = format!("{}-{}", prefix, i);
                let count = outcome.captured.lines().filter(|l| *l == line).count();
                assert_eq!(count, 1, "expected exactly one {:?}", line);
            }
        }
        assert_eq!(outcome.captured.lines().count(), 400);
    }

    #[test]
    fn arguments_are_passed_verbatim() {
        let inv = Invocation::new("sh", Duration::from_secs(10))
            .unwrap()
            .with_args(["-c", "printf '%s|' \"$@\"", "sh", "a b", "c'd", ""]);
        let outcome = quiet().run(&inv);

        assert_eq!(outcome.captured, "a b|c'd||");
    }
}
