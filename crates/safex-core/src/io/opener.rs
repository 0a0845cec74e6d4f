//! Symlink-refusing file creation and the session file table.

use std::fmt;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;

/// Opens `path` for writing, creating or truncating it.
///
/// With `no_follow` set, a symlink in the final path component makes the
/// open fail atomically with `SymlinkDenied`: on Unix the open carries
/// `O_NOFOLLOW`, so no check-then-open window exists and nothing is
/// created through the link. Intermediate components are followed; the
/// caller is responsible for having resolved them.
///
/// # Errors
///
/// - `SymlinkDenied` if the final component is a symlink and `no_follow`
///   is set
/// - `PermissionDenied` if the OS refuses access
/// - `Io` for any other failure
pub fn open_file(path: &Path, no_follow: bool) -> Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);

    #[cfg(unix)]
    if no_follow {
        use std::os::unix::fs::OpenOptionsExt;
        opts.custom_flags(libc::O_NOFOLLOW);
    }

    #[cfg(not(unix))]
    if no_follow
        && std::fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    {
        return Err(ExtractionError::SymlinkDenied {
            path: path.to_path_buf(),
        });
    }

    opts.open(path).map_err(|e| map_open_error(e, path, no_follow))
}

fn map_open_error(err: std::io::Error, path: &Path, no_follow: bool) -> ExtractionError {
    #[cfg(unix)]
    if no_follow && err.raw_os_error() == Some(libc::ELOOP) {
        return ExtractionError::SymlinkDenied {
            path: path.to_path_buf(),
        };
    }
    #[cfg(not(unix))]
    let _ = no_follow;

    if err.kind() == std::io::ErrorKind::PermissionDenied {
        return ExtractionError::PermissionDenied {
            path: path.to_path_buf(),
        };
    }
    ExtractionError::Io(err)
}

/// Typed handle to a file owned by a [`FileTable`].
///
/// A handle is only meaningful for the table that issued it. The
/// generation makes a handle stale once it has been closed, even if its
/// slot is later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle {
    index: usize,
    generation: u32,
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    open: Option<OpenFile>,
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    path: PathBuf,
}

/// Session-owned table of files opened for extraction.
///
/// Dropping the table closes every file still open.
///
/// # Examples
///
/// ```no_run
/// use safex_core::io::FileTable;
/// use std::path::Path;
///
/// # fn main() -> Result<(), safex_core::ExtractionError> {
/// let mut table = FileTable::new();
/// let handle = table.open(Path::new("/tmp/out/file.txt"), true)?;
/// table.write_all(handle, b"hello")?;
/// table.close(handle)?;
///
/// assert!(table.close(handle).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FileTable {
    slots: Vec<Slot>,
}

impl FileTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a file via [`open_file`] and registers it.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`open_file`].
    pub fn open(&mut self, path: &Path, no_follow: bool) -> Result<FileHandle> {
        let file = open_file(path, no_follow)?;
        let open = Some(OpenFile {
            file,
            path: path.to_path_buf(),
        });

        if let Some(index) = self.slots.iter().position(|slot| slot.open.is_none()) {
            let slot = &mut self.slots[index];
            slot.open = open;
            return Ok(FileHandle {
                index,
                generation: slot.generation,
            });
        }

        self.slots.push(Slot {
            generation: 0,
            open,
        });
        Ok(FileHandle {
            index: self.slots.len() - 1,
            generation: 0,
        })
    }

    /// Writes the whole buffer to an open file.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if the handle is closed, `Io` if the write fails.
    pub fn write_all(&mut self, handle: FileHandle, buf: &[u8]) -> Result<()> {
        let open = self.lookup(handle)?;
        open.file.write_all(buf)?;
        Ok(())
    }

    /// Borrows the underlying file for streaming writes.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if the handle is closed.
    pub fn file_mut(&mut self, handle: FileHandle) -> Result<&mut File> {
        Ok(&mut self.lookup(handle)?.file)
    }

    /// Path the handle was opened with.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if the handle is closed.
    pub fn path(&self, handle: FileHandle) -> Result<&Path> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.open.as_ref())
            .map(|open| open.path.as_path())
            .ok_or_else(|| stale(handle))
    }

    /// Flushes and closes a file, invalidating its handle.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if the handle was already closed, `Io` if the final
    /// flush fails. The handle is invalidated in both cases.
    pub fn close(&mut self, handle: FileHandle) -> Result<()> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation && slot.open.is_some())
            .ok_or_else(|| stale(handle))?;

        slot.generation = slot.generation.wrapping_add(1);
        if let Some(mut open) = slot.open.take() {
            open.file.flush()?;
        }
        Ok(())
    }

    /// Number of files currently open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.open.is_some()).count()
    }

    fn lookup(&mut self, handle: FileHandle) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.open.as_mut())
            .ok_or_else(|| stale(handle))
    }
}

fn stale(handle: FileHandle) -> ExtractionError {
    ExtractionError::StaleHandle {
        handle: handle.to_string(),
    }
}
