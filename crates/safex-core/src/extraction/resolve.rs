//! Resolution of validated entry paths against the destination root.
//!
//! A [`SafePath`] is free of `..` and root indicators, but directories
//! already under the destination may be symlinks. Every existing
//! component is therefore inspected with `symlink_metadata`, symlinks are
//! canonicalized, and the running result is re-checked against the
//! boundary after each step.

use std::fs;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::ExtractionError;
use crate::Result;
use crate::security::is_within;
use crate::types::DestDir;
use crate::types::SafePath;

/// Resolves where a file entry would land, without touching the
/// filesystem beyond metadata lookups.
///
/// The parent chain is resolved up to its deepest existing ancestor, the
/// remaining components are appended lexically, and the final name is
/// appended last. The final component is not followed; opening with
/// `O_NOFOLLOW` covers it.
///
/// # Errors
///
/// `BoundaryEscape` if the result leaves the root, `Io` if metadata cannot
/// be read or a parent component is not a directory.
pub fn resolve_entry(dest: &DestDir, path: &SafePath) -> Result<PathBuf> {
    let (parent, name) = split(path)?;
    let resolved = walk(dest, parent, false)?.join(name);
    ensure_inside(&resolved, dest)?;
    Ok(resolved)
}

/// Creates the missing parent directories of a file entry one component
/// at a time and returns the real parent directory.
///
/// # Errors
///
/// `BoundaryEscape` if any existing or newly created component resolves
/// outside the root, `Io` if creation fails.
pub fn create_parents(dest: &DestDir, path: &SafePath) -> Result<PathBuf> {
    let (parent, _) = split(path)?;
    walk(dest, parent, true)
}

/// Resolves a directory entry without creating it.
///
/// # Errors
///
/// Same as [`resolve_entry`].
pub fn resolve_directory(dest: &DestDir, path: &SafePath) -> Result<PathBuf> {
    let resolved = walk(dest, path.as_path(), false)?;
    ensure_inside(&resolved, dest)?;
    Ok(resolved)
}

/// Creates a directory entry and all its missing ancestors.
///
/// # Errors
///
/// Same as [`create_parents`].
pub fn create_directory(dest: &DestDir, path: &SafePath) -> Result<PathBuf> {
    let created = walk(dest, path.as_path(), true)?;
    ensure_inside(&created, dest)?;
    Ok(created)
}

fn split(path: &SafePath) -> Result<(&Path, &std::ffi::OsStr)> {
    let relative = path.as_path();
    let name = relative
        .file_name()
        .ok_or_else(|| ExtractionError::InvalidPath {
            path: relative.display().to_string(),
            reason: "entry names the destination root".to_string(),
        })?;
    Ok((relative.parent().unwrap_or_else(|| Path::new("")), name))
}

fn walk(dest: &DestDir, relative: &Path, create: bool) -> Result<PathBuf> {
    let mut current = dest.as_path().to_path_buf();
    let mut missing = false;

    for component in relative.components() {
        let next = current.join(component);

        if missing && !create {
            current = next;
            continue;
        }

        match fs::symlink_metadata(&next) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let target = follow_link(&next, &current, dest)?;
                ensure_inside_or_root(&target, dest)?;
                if !target.is_dir() {
                    return Err(not_a_directory(&next));
                }
                current = target;
            }
            Ok(meta) if meta.is_dir() => current = next,
            Ok(_) => return Err(not_a_directory(&next)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if create {
                    make_dir(&next)?;
                } else {
                    missing = true;
                }
                current = next;
            }
            Err(e) => return Err(e.into()),
        }

        ensure_inside_or_root(&current, dest)?;
    }

    Ok(current)
}

/// Canonicalizes a symlinked component. A link that cannot be
/// canonicalized (dangling, or looping) is judged by its lexical target so
/// that one pointing outside the root is still a boundary escape.
fn follow_link(link: &Path, parent: &Path, dest: &DestDir) -> Result<PathBuf> {
    let err = match link.canonicalize() {
        Ok(target) => return Ok(target),
        Err(e) => e,
    };

    let lexical = lexical_join(parent, &fs::read_link(link)?);
    ensure_inside_or_root(&lexical, dest)?;
    Err(err.into())
}

fn lexical_join(base: &Path, target: &Path) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in target.components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

fn make_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => debug!(path = %path.display(), "created directory"),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }

    // Re-check what is on disk now; a racing writer may have put a
    // symlink or file there.
    if !fs::symlink_metadata(path)?.is_dir() {
        return Err(not_a_directory(path));
    }
    Ok(())
}

fn ensure_inside(path: &Path, dest: &DestDir) -> Result<()> {
    if is_within(path, dest) {
        Ok(())
    } else {
        Err(ExtractionError::BoundaryEscape {
            path: path.to_path_buf(),
        })
    }
}

fn ensure_inside_or_root(path: &Path, dest: &DestDir) -> Result<()> {
    if path == dest.as_path() {
        return Ok(());
    }
    ensure_inside(path, dest)
}

fn not_a_directory(path: &Path) -> ExtractionError {
    ExtractionError::Io(io::Error::new(
        io::ErrorKind::NotADirectory,
        format!("not a directory: {}", path.display()),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("failed to create dest");
        (temp, dest)
    }

    fn safe(raw: &str) -> SafePath {
        SafePath::parse(raw, 4096).unwrap()
    }

    #[test]
    fn test_resolve_missing_parents_is_lexical() {
        let (_temp, dest) = setup();
        let resolved = resolve_entry(&dest, &safe("a/b/c.txt")).unwrap();
        assert_eq!(resolved, dest.join(Path::new("a/b/c.txt")));
        assert!(!dest.join(Path::new("a")).exists(), "resolve must not create");
    }

    #[test]
    fn test_resolve_root_is_invalid() {
        let (_temp, dest) = setup();
        assert!(matches!(
            resolve_entry(&dest, &safe("./")),
            Err(ExtractionError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_create_parents_one_component_at_a_time() {
        let (_temp, dest) = setup();
        let parent = create_parents(&dest, &safe("x/y/z/file.txt")).unwrap();
        assert_eq!(parent, dest.join(Path::new("x/y/z")));
        assert!(parent.is_dir());
    }

    #[test]
    fn test_parent_is_regular_file() {
        let (_temp, dest) = setup();
        fs::write(dest.join(Path::new("blocker")), "x").unwrap();
        let result = create_parents(&dest, &safe("blocker/file.txt"));
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_parent_escaping_root() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = setup();
        let outside = TempDir::new().expect("failed to create temp dir");
        symlink(outside.path(), dest.join(Path::new("escape"))).unwrap();

        assert!(matches!(
            resolve_entry(&dest, &safe("escape/passwd")),
            Err(ExtractionError::BoundaryEscape { .. })
        ));
        assert!(matches!(
            create_parents(&dest, &safe("escape/sub/passwd")),
            Err(ExtractionError::BoundaryEscape { .. })
        ));
        assert!(!outside.path().join("sub").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_parent_inside_root() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = setup();
        fs::create_dir(dest.join(Path::new("real"))).unwrap();
        symlink("real", dest.join(Path::new("alias"))).unwrap();

        let resolved = resolve_entry(&dest, &safe("alias/file.txt")).unwrap();
        assert_eq!(resolved, dest.join(Path::new("real/file.txt")));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_to_root_itself() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = setup();
        symlink(".", dest.join(Path::new("self"))).unwrap();
        let resolved = resolve_entry(&dest, &safe("self/file.txt")).unwrap();
        assert_eq!(resolved, dest.join(Path::new("file.txt")));
    }

    #[test]
    #[cfg(unix)]
    fn test_dangling_symlink_outside_root() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = setup();
        symlink("/nonexistent-safex-target/sub", dest.join(Path::new("abs"))).unwrap();
        symlink("../../gone", dest.join(Path::new("rel"))).unwrap();

        for raw in ["abs/x", "rel/x", "rel/deeper/x"] {
            assert!(
                matches!(
                    resolve_entry(&dest, &safe(raw)),
                    Err(ExtractionError::BoundaryEscape { .. })
                ),
                "{raw} not reported as an escape"
            );
            assert!(matches!(
                create_parents(&dest, &safe(raw)),
                Err(ExtractionError::BoundaryEscape { .. })
            ));
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_dangling_symlink_inside_root_is_io() {
        use std::os::unix::fs::symlink;

        let (_temp, dest) = setup();
        symlink("missing", dest.join(Path::new("link"))).unwrap();

        assert!(matches!(
            resolve_entry(&dest, &safe("link/x")),
            Err(ExtractionError::Io(_))
        ));
        assert!(!dest.join(Path::new("missing")).exists());
    }

    #[test]
    fn test_lexical_join() {
        let base = Path::new("/root/a");
        assert_eq!(lexical_join(base, Path::new("../b/./c")), Path::new("/root/b/c"));
        assert_eq!(lexical_join(base, Path::new("/etc")), Path::new("/etc"));
        assert_eq!(lexical_join(base, Path::new("../../..")), Path::new("/"));
    }

    #[test]
    fn test_create_directory_idempotent() {
        let (_temp, dest) = setup();
        let first = create_directory(&dest, &safe("d/e")).unwrap();
        let second = create_directory(&dest, &safe("d/e/")).unwrap();
        assert_eq!(first, second);
        assert!(resolve_directory(&dest, &safe("d/e")).is_ok());
    }
}
