//! Syntactic validation of declared entry paths.

use crate::Result;
use crate::SecurityConfig;
use crate::config::DEFAULT_MAX_PATH_LENGTH;
use crate::types::SafePath;

/// Returns `true` if a declared entry path is syntactically safe.
///
/// This is the boolean form of [`SafePath::parse`] with the default
/// maximum path length, except that a path naming no component at all
/// (`.`, `./`) is refused. It never touches the filesystem; a `true`
/// result says nothing about symlinks already present under the
/// destination.
///
/// # Examples
///
/// ```
/// use safex_core::security::validate_entry_path;
///
/// assert!(validate_entry_path("foo/bar.txt"));
/// assert!(!validate_entry_path("../etc/passwd"));
/// assert!(!validate_entry_path("/etc/passwd"));
/// assert!(!validate_entry_path("C:\\Windows"));
/// assert!(!validate_entry_path("./"));
/// ```
#[must_use]
pub fn validate_entry_path(path: &str) -> bool {
    SafePath::parse(path, DEFAULT_MAX_PATH_LENGTH).is_ok_and(|safe| !safe.is_root())
}

/// Validates a declared entry path using the configured length limit.
///
/// # Errors
///
/// Returns `ExtractionError::InvalidPath` with the reason for rejection.
pub fn validate_path(path: &str, config: &SecurityConfig) -> Result<SafePath> {
    SafePath::parse(path, config.max_path_length)
}
