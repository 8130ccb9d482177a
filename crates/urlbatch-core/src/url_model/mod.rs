//! Destination naming for batches without explicit output names.
//!
//! The file name is the last segment of the URL path (query and fragment
//! dropped); a URL whose path ends in `/` falls back to its host. The result
//! is sanitized for Linux filesystems.

mod path;
mod sanitize;

use std::path::{Path, PathBuf};

pub use path::{filename_from_url_path, host_from_url};
pub use sanitize::sanitize_filename_for_linux;

/// Default filename when neither the URL path nor its host yields anything usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe filename for a locator.
///
/// # Examples
///
/// - `derive_filename("https://example.com/a/photo.jpg?size=xl")` → `"photo.jpg"`
/// - `derive_filename("https://www.jython.org/")` → `"www.jython.org"`
pub fn derive_filename(locator: &str) -> String {
    let raw = match filename_from_url_path(locator).or_else(|| host_from_url(locator)) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Destination path for `locator` under `out_root`.
pub fn derive_destination(locator: &str, out_root: &Path) -> PathBuf {
    out_root.join(derive_filename(locator))
}
