//! Validated relative entry path.

use crate::ExtractionError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// A declared entry path that passed syntactic validation.
///
/// `SafePath` holds the normalized, purely relative form of an archive
/// entry's path. It guarantees that the path:
/// - is non-empty as declared and within the length limit
/// - has no root indicator (leading separator or drive letter)
/// - has no `..` component
/// - has no control characters (including NUL)
///
/// Both `/` and `\` are treated as separators so that archives produced
/// on either platform cannot smuggle traversal through the other's
/// separator. `.` components and repeated separators are dropped.
///
/// # Security Properties
///
/// - Can ONLY be constructed through [`SafePath::parse`]
/// - NO `From<String>` implementation
/// - Says nothing about symlinks on disk; that is the boundary check's job
///
/// # Examples
///
/// ```
/// use safex_core::types::SafePath;
///
/// let safe = SafePath::parse("foo/./bar.txt", 4096)?;
/// assert_eq!(safe.as_path(), std::path::Path::new("foo/bar.txt"));
///
/// assert!(SafePath::parse("../etc/passwd", 4096).is_err());
/// # Ok::<(), safex_core::ExtractionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates and normalizes a declared entry path.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject the empty string
    /// 2. Reject paths longer than `max_length` bytes
    /// 3. Reject control characters
    /// 4. Reject leading separators (absolute paths)
    /// 5. Split on `/` and `\`, rejecting `..` and drive-letter components
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidPath` naming the first failed step.
    pub fn parse(raw: &str, max_length: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(invalid(raw, "empty path"));
        }

        if raw.len() > max_length {
            return Err(invalid(
                raw,
                format!("path length {} exceeds maximum {max_length}", raw.len()),
            ));
        }

        if let Some(c) = raw.chars().find(|c| c.is_control()) {
            return Err(invalid(
                raw,
                format!("control character {:#04x}", u32::from(c)),
            ));
        }

        if raw.starts_with(['/', '\\']) {
            return Err(invalid(raw, "absolute path"));
        }

        let mut normalized = PathBuf::new();
        for component in raw.split(['/', '\\']) {
            let first = normalized.as_os_str().is_empty();
            match component {
                "" | "." => {}
                ".." => return Err(invalid(raw, "parent directory component")),
                name if is_drive_component(name, first) => {
                    return Err(invalid(raw, "drive-letter prefix"));
                }
                name => normalized.push(name),
            }
        }

        Ok(Self(normalized))
    }

    /// Returns `true` if the path normalized to nothing (e.g. `./`).
    ///
    /// Such a path designates the destination root itself.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }

    /// Number of normal components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.components().count()
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

fn invalid(raw: &str, reason: impl Into<String>) -> ExtractionError {
    ExtractionError::InvalidPath {
        path: raw.to_string(),
        reason: reason.into(),
    }
}

/// Whether `component` is refused as a drive designator. Outside Windows
/// only the first named component can act as one; `docs/c:notes` is an
/// ordinary POSIX name.
pub(crate) fn is_drive_component(component: &str, first: bool) -> bool {
    (first || cfg!(windows)) && has_drive_prefix(component)
}

/// Checks for a Windows drive designator such as `C:` or `c:foo`.
fn has_drive_prefix(component: &str) -> bool {
    let bytes = component.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
