//! Persisting fetched payloads.
//!
//! Bytes go to a uniquely named `.part` temp file next to the destination,
//! are synced, and are then renamed into place. A failed or interrupted write
//! never leaves anything at the destination path.

use std::io::Write;
use std::path::Path;

use crate::error::{BatchError, Result};

/// Temporary file suffix used before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Write `bytes` verbatim to `destination`, replacing any existing file.
pub fn persist(bytes: &[u8], destination: &Path) -> Result<()> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| BatchError::io("create destination dir", parent, e))?;

    let prefix = match destination.file_name() {
        Some(name) => format!(".{}.", name.to_string_lossy()),
        None => ".urlbatch.".to_string(),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| BatchError::io("create temp file in", parent, e))?;

    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| BatchError::io("write temp file for", destination, e))?;

    // On error the temp file is removed when the returned handle drops.
    tmp.persist(destination)
        .map_err(|e| BatchError::io("rename into place", destination, e.error))?;
    Ok(())
}
