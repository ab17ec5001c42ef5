//! Child-process execution core.
//!
//! - [`tokenize`] splits free-form argument strings into argv vectors.
//! - [`invocation`] holds the [`Invocation`] / [`Outcome`] contract values.
//! - [`runner`] spawns a child under a deadline and classifies its end.
//! - [`streamer`] relays the child's stdout/stderr to console and capture.
//! - [`shell`] runs sequential, non-captured helper commands.

pub mod error;
pub mod invocation;
pub mod runner;
pub mod shell;
pub mod streamer;
pub mod tokenize;

pub use error::RunError;
pub use invocation::{Invocation, Outcome};
pub use runner::{Echo, ProcessRunner};
pub use tokenize::tokenize;
