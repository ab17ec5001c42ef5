//! Concurrent relay of child output streams.
//!
//! Each stream gets its own thread that copies bytes to a console writer and
//! to a capture buffer shared by all relays. The buffer sits behind a mutex,
//! so chunks from different streams never tear; bytes within one stream keep
//! their source order, but stdout and stderr chunks interleave in whatever
//! order the relays happen to win the lock.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 8192;

/// Which child stream a relay is copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Completion message sent by a relay thread.
#[derive(Debug)]
struct RelayReport {
    stream: Stream,
    bytes: u64,
    read_error: Option<io::Error>,
    echo_error: Option<io::Error>,
}

/// What the relays produced once they were joined (or given up on).
#[derive(Debug, Default)]
pub struct Streamed {
    pub captured: String,
    pub warnings: Vec<String>,
}

/// Fans child output out to per-stream relay threads and joins them.
pub struct OutputStreamer {
    capture: Arc<Mutex<Vec<u8>>>,
    tx: Option<Sender<RelayReport>>,
    rx: Receiver<RelayReport>,
    pending: Vec<Stream>,
    warnings: Vec<String>,
}

impl Default for OutputStreamer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputStreamer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            capture: Arc::new(Mutex::new(Vec::new())),
            tx: Some(tx),
            rx,
            pending: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Start relaying `source` to `echo` and the shared capture buffer.
    pub fn relay<R, W>(&mut self, stream: Stream, source: R, echo: W)
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let Some(tx) = self.tx.clone() else {
            self.warnings
                .push(format!("{} relay requested after streamer was joined", stream));
            return;
        };
        let capture = Arc::clone(&self.capture);
        let spawned = thread::Builder::new()
            .name(format!("relay-{}", stream))
            .spawn(move || {
                let report = copy_stream(stream, source, echo, &capture);
                // The receiver is gone only if the streamer was dropped early.
                let _ = tx.send(report);
            });

        match spawned {
            Ok(_) => self.pending.push(stream),
            Err(e) => self
                .warnings
                .push(format!("failed to start {} relay: {}", stream, e)),
        }
    }

    /// Wait for every relay to reach end-of-stream, up to `deadline`.
    ///
    /// Returns `true` once all relays have reported. Reports are consumed, so
    /// this can be called again with a later deadline; no new relays can be
    /// started afterwards.
    pub fn wait_until(&mut self, deadline: Instant) -> bool {
        self.tx = None;
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(report) => self.record(report),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.abandon_pending("relay thread exited without reporting");
                    return true;
                }
            }
        }
        true
    }

    /// Join the relays and hand back the captured text.
    ///
    /// With `grace == None` this blocks until both streams close. With a grace
    /// period, relays still running when it elapses are detached and noted in
    /// the warnings; whatever they had copied so far is kept.
    pub fn finish(mut self, grace: Option<Duration>) -> Streamed {
        match grace {
            Some(grace) => {
                if !self.wait_until(Instant::now() + grace) {
                    self.abandon_pending("relay still running after drain grace period; detached");
                }
            }
            None => {
                self.tx = None;
                while !self.pending.is_empty() {
                    match self.rx.recv() {
                        Ok(report) => self.record(report),
                        Err(_) => {
                            self.abandon_pending("relay thread exited without reporting");
                        }
                    }
                }
            }
        }

        let captured = {
            let buf = self.capture.lock().unwrap_or_else(|p| p.into_inner());
            String::from_utf8_lossy(&buf).into_owned()
        };

        Streamed {
            captured,
            warnings: self.warnings,
        }
    }

    fn record(&mut self, report: RelayReport) {
        self.pending.retain(|s| *s != report.stream);
        debug!(stream = %report.stream, bytes = report.bytes, "relay finished");

        if let Some(e) = report.read_error {
            let msg = format!("output streaming error on {}: {}", report.stream, e);
            warn!("{}", msg);
            self.warnings.push(msg);
        }
        if let Some(e) = report.echo_error {
            let msg = format!("console echo of {} stopped: {}", report.stream, e);
            warn!("{}", msg);
            self.warnings.push(msg);
        }
    }

    fn abandon_pending(&mut self, reason: &str) {
        for stream in self.pending.drain(..) {
            let msg = format!("{} {}", stream, reason);
            warn!("{}", msg);
            self.warnings.push(msg);
        }
    }
}

/// Copy `source` until end-of-stream.
///
/// A failing console only stops the echo; capture continues so the pipe keeps
/// draining and the child never blocks on a full buffer. A UTF-8 sequence cut
/// by a read boundary is held back until its remaining bytes arrive, so the
/// other relay can never land inside it.
fn copy_stream<R: Read, W: Write>(
    stream: Stream,
    mut source: R,
    mut echo: W,
    capture: &Mutex<Vec<u8>>,
) -> RelayReport {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut held: Vec<u8> = Vec::new();
    let mut bytes = 0u64;
    let mut echo_error = None;

    let read_error = loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break None,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Some(e),
        };
        let chunk = &buf[..n];
        bytes += n as u64;

        held.extend_from_slice(chunk);
        let complete = complete_utf8_len(&held);
        if complete > 0 {
            capture
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .extend_from_slice(&held[..complete]);
            held.drain(..complete);
        }

        if echo_error.is_none()
            && let Err(e) = echo.write_all(chunk).and_then(|_| echo.flush())
        {
            echo_error = Some(e);
        }
    };

    // A dangling partial sequence at end-of-stream is kept as-is.
    if !held.is_empty() {
        capture
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(&held);
    }

    RelayReport {
        stream,
        bytes,
        read_error,
        echo_error,
    }
}

/// Length of `bytes` without a trailing, still incomplete UTF-8 sequence.
///
/// Invalid bytes count as complete; only a valid prefix of a multibyte
/// character at the very end is held back.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let tail_start = bytes.len().saturating_sub(3);
    let tail = &bytes[tail_start..];
    // Start of the last character whose lead byte lies in the tail.
    let Some(lead) = tail.iter().rposition(|b| b & 0xC0 != 0x80) else {
        return bytes.len();
    };
    let lead_at = tail_start + lead;
    match std::str::from_utf8(&bytes[lead_at..]) {
        Err(e) if e.valid_up_to() == 0 && e.error_len().is_none() => lead_at,
        _ => bytes.len(),
    }
}
