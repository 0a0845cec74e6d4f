//! Validated safe symlink type.

use crate::ExtractionError;
use crate::Result;
use crate::SecurityConfig;
use crate::security::boundary::is_within;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use super::SafePath;
use super::safe_path::is_drive_component;

/// A validated symlink entry that is safe to create.
///
/// `SafeSymlink` represents a symbolic link where:
/// - The link path is a valid `SafePath`
/// - The target is relative and free of control characters
/// - The target, resolved lexically against the link's parent, stays
///   inside the destination root
/// - Symlinks are allowed by the security configuration
///
/// The target may not exist yet, so it is resolved lexically from the
/// link's already-resolved parent directory. Writes that later pass through
/// the link are re-checked at resolution time by the orchestrator.
///
/// # Examples
///
/// ```no_run
/// use safex_core::SecurityConfig;
/// use safex_core::types::DestDir;
/// use safex_core::types::SafePath;
/// use safex_core::types::SafeSymlink;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp")?;
/// let config = SecurityConfig::default().with_symlinks(true);
///
/// let link = SafePath::parse("dir/link", config.max_path_length)?;
/// let parent = dest.join(std::path::Path::new("dir"));
/// let symlink = SafeSymlink::validate(&link, "../file.txt", &parent, &dest, &config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSymlink {
    link_path: PathBuf,
    target_path: PathBuf,
}

impl SafeSymlink {
    /// Validates and constructs a `SafeSymlink`.
    ///
    /// `link_parent` is the resolved absolute directory that will contain
    /// the link; the target's leading `..` components are applied to it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Symlinks are not allowed by configuration (`InvalidPath`)
    /// - Target is empty, absolute or malformed (`InvalidPath`)
    /// - Resolved target escapes the destination (`BoundaryEscape`)
    pub fn validate(
        link: &SafePath,
        target: &str,
        link_parent: &Path,
        dest: &DestDir,
        config: &SecurityConfig,
    ) -> Result<Self> {
        let reject = |reason: &str| ExtractionError::InvalidPath {
            path: link.as_path().display().to_string(),
            reason: reason.to_string(),
        };

        if !config.allow_symlinks {
            return Err(reject("symlinks not allowed"));
        }
        if link.is_root() {
            return Err(reject("symlink cannot replace the destination root"));
        }
        if target.is_empty() {
            return Err(reject("empty symlink target"));
        }
        if target.len() > config.max_path_length {
            return Err(reject("symlink target too long"));
        }
        if target.chars().any(char::is_control) {
            return Err(reject("control character in symlink target"));
        }
        if target.starts_with(['/', '\\']) {
            return Err(reject("absolute symlink target"));
        }

        // Leading `..` components are resolved against the real parent
        // directory. A `..` after a name would be resolved by the OS through
        // whatever that name points to, so it is refused outright.
        let mut resolved = link_parent.to_path_buf();
        let mut target_path = PathBuf::new();
        let mut seen_name = false;
        for component in target.split(['/', '\\']) {
            match component {
                "" | "." => {}
                ".." if seen_name => {
                    return Err(reject("parent directory component after a name"));
                }
                ".." => {
                    resolved.pop();
                    target_path.push("..");
                }
                name if is_drive_component(name, !seen_name) => {
                    return Err(reject("drive-letter symlink target"));
                }
                name => {
                    seen_name = true;
                    resolved.push(name);
                    target_path.push(name);
                }
            }
        }

        if target_path.as_os_str().is_empty() {
            target_path.push(".");
        }

        if resolved != dest.as_path() && !is_within(&resolved, dest) {
            return Err(ExtractionError::BoundaryEscape { path: resolved });
        }

        Ok(Self {
            link_path: link.as_path().to_path_buf(),
            target_path,
        })
    }

    /// Returns the link path relative to the destination.
    #[inline]
    #[must_use]
    pub fn link_path(&self) -> &Path {
        &self.link_path
    }

    /// Returns the normalized relative target as it will be stored in the
    /// symlink.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}
