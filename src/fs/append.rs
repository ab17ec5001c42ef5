//! Append-only writes to files shared with the Actions runner.

use crate::error::{ActionError, Result};
use std::io::Write;
use std::path::Path;

/// Append `content` to `path`, creating the file if needed.
pub fn append_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ActionError::SetupError(format!("failed to open '{}': {}", path.display(), e))
        })?;

    file.write_all(content.as_bytes()).map_err(|e| {
        ActionError::SetupError(format!("failed to write to '{}': {}", path.display(), e))
    })?;

    Ok(())
}
