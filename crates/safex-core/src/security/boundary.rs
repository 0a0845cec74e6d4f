//! Containment of resolved paths inside the destination root.

use std::path::Path;

use crate::types::DestDir;

/// Returns `true` if `resolved` lies strictly inside the boundary root.
///
/// `root_with_separator` must end with a path separator. The comparison is
/// a plain byte-prefix test, so `/dest/` matches `/dest/sub/file` but never
/// `/destination-evil/file`. A root passed without its trailing separator
/// never matches anything, and the root itself is not "inside".
///
/// `resolved` must already be absolute and free of `..` and symlinks; this
/// function does not touch the filesystem.
///
/// # Examples
///
/// ```
/// use safex_core::security::is_path_safe;
///
/// assert!(is_path_safe("/dest/sub/file", "/dest/"));
/// assert!(!is_path_safe("/destination-evil/file", "/dest/"));
/// assert!(!is_path_safe("/dest/file", "/dest"));
/// ```
#[must_use]
pub fn is_path_safe(resolved: &str, root_with_separator: &str) -> bool {
    is_prefixed(resolved.as_bytes(), root_with_separator.as_bytes())
}

/// Typed form of [`is_path_safe`] that compares against
/// [`DestDir::with_separator`].
#[must_use]
pub fn is_within(resolved: &Path, dest: &DestDir) -> bool {
    is_prefixed(
        resolved.as_os_str().as_encoded_bytes(),
        dest.with_separator().as_encoded_bytes(),
    )
}

fn is_prefixed(resolved: &[u8], root: &[u8]) -> bool {
    let terminated = matches!(root.last(), Some(b'/' | b'\\'));
    terminated && resolved.len() > root.len() && resolved.starts_with(root)
}
