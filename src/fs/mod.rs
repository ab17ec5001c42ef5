//! Filesystem utilities for iflow-action.
//!
//! Atomic writes for the settings file, and appends for the files GitHub
//! Actions collects outputs and step summaries from.

mod append;
pub mod atomic;

pub use append::append_to_file;
pub use atomic::atomic_write;
