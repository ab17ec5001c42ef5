//! Configuration model for iflow-action.
//!
//! A [`Config`] is resolved once from command-line flags and, in GitHub
//! Actions mode, `INPUT_*` environment variables. It is an immutable value
//! afterwards; nothing in the crate reads configuration from global state.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::Mode;
