//! Validated destination directory type.

use crate::ExtractionError;
use crate::Result;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;
use std::path::MAIN_SEPARATOR_STR;
use std::path::Path;
use std::path::PathBuf;

/// Canonical, writable root of one extraction.
///
/// Every containment check compares against [`with_separator`], the root
/// followed by exactly one separator, so `/dest` never admits
/// `/destination-evil`. The root is resolved once and never changes; an
/// unusable root fails the whole extraction, not a single entry.
///
/// ```no_run
/// use safex_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/extraction")?;
/// assert!(dest.as_path().is_absolute());
/// # Ok(())
/// # }
/// ```
///
/// [`with_separator`]: DestDir::with_separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir {
    root: PathBuf,
    with_separator: OsString,
}

impl DestDir {
    /// Resolves `path` to its canonical form and checks that it is a
    /// directory the process may write into.
    ///
    /// # Errors
    ///
    /// `Io` when the path cannot be resolved or is not a directory.
    /// `PermissionDenied` when it is not writable (Unix only).
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let root = path.canonicalize().map_err(|e| {
            ExtractionError::Io(io::Error::new(
                e.kind(),
                format!("cannot resolve destination {}: {e}", path.display()),
            ))
        })?;

        if !root.is_dir() {
            return Err(ExtractionError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("destination {} is not a directory", root.display()),
            )));
        }

        #[cfg(unix)]
        check_writable(&root)?;

        let with_separator = separator_terminated(&root);
        Ok(Self {
            root,
            with_separator,
        })
    }

    /// Canonical root.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.root
    }

    /// Root plus a single trailing separator.
    #[inline]
    #[must_use]
    pub fn with_separator(&self) -> &OsStr {
        &self.with_separator
    }

    /// Lexical join; does not touch the filesystem.
    #[inline]
    #[must_use]
    pub fn join(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Consumes the root.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.root
    }
}

fn separator_terminated(root: &Path) -> OsString {
    let mut with_separator = root.as_os_str().to_os_string();
    if !root.as_os_str().as_encoded_bytes().ends_with(MAIN_SEPARATOR_STR.as_bytes()) {
        with_separator.push(MAIN_SEPARATOR_STR);
    }
    with_separator
}

/// Checks effective write permission with `access(2)`.
#[cfg(unix)]
fn check_writable(root: &Path) -> Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_root = CString::new(root.as_os_str().as_bytes())
        .map_err(|e| ExtractionError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    // SAFETY: `c_root` is NUL-terminated and lives across the call.
    #[allow(unsafe_code)]
    let writable = unsafe { libc::access(c_root.as_ptr(), libc::W_OK) } == 0;

    if writable {
        Ok(())
    } else {
        Err(ExtractionError::PermissionDenied {
            path: root.to_path_buf(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_dotted_path() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("inner")).unwrap();

        let dest = DestDir::new(temp.path().join("inner/./..")).unwrap();

        assert!(dest.as_path().is_absolute());
        assert_eq!(dest.as_path(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_and_non_directory_roots() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain");
        fs::write(&file, b"x").unwrap();

        for candidate in [temp.path().join("absent"), file] {
            let result = DestDir::new(&candidate);
            assert!(
                matches!(result, Err(ExtractionError::Io(_))),
                "{} accepted",
                candidate.display()
            );
        }
    }

    #[test]
    fn test_separator_form() {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();

        let root = dest.as_path().as_os_str().as_encoded_bytes();
        let with_sep = dest.with_separator().as_encoded_bytes();
        assert_eq!(&with_sep[..root.len()], root);
        assert_eq!(&with_sep[root.len()..], MAIN_SEPARATOR_STR.as_bytes());
    }

    #[test]
    #[cfg(unix)]
    fn test_filesystem_root_not_doubled() {
        assert_eq!(separator_terminated(Path::new("/")), OsString::from("/"));
    }

    #[test]
    #[cfg(unix)]
    fn test_read_only_root_denied() {
        use std::os::unix::fs::PermissionsExt;

        // SAFETY: geteuid() has no preconditions.
        #[allow(unsafe_code)]
        let is_root = unsafe { libc::geteuid() } == 0;
        if is_root {
            return;
        }

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let result = DestDir::new(&locked);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ExtractionError::PermissionDenied { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_root_resolved() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("alias")).unwrap();

        let dest = DestDir::new(temp.path().join("alias")).unwrap();

        assert_eq!(dest.as_path(), real.canonicalize().unwrap());
        assert_eq!(dest.join(Path::new("a/b")), dest.as_path().join("a/b"));
    }
}
