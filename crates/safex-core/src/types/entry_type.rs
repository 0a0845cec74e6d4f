//! Archive entry type enumeration.

/// Type of entry in an archive, as declared by the codec.
///
/// Link targets are raw, untrusted strings and must be validated before
/// use.
///
/// # Examples
///
/// ```
/// use safex_core::types::EntryType;
///
/// let file = EntryType::File;
/// let symlink = EntryType::Symlink {
///     target: "../target".to_string(),
/// };
/// assert!(symlink.is_symlink());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file entry.
    File,

    /// Directory entry.
    Directory,

    /// Symbolic link entry.
    Symlink {
        /// The symlink target (not yet validated).
        target: String,
    },

    /// Hard link entry. Never extracted.
    Hardlink {
        /// The hardlink target (not yet validated).
        target: String,
    },

    /// Device nodes, FIFOs, global headers and anything else the core does
    /// not materialize.
    Other {
        /// Codec-specific description of the entry kind.
        kind: String,
    },
}

impl EntryType {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symlink.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink { .. })
    }

    /// Short lowercase name used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink { .. } => "symlink",
            Self::Hardlink { .. } => "hardlink",
            Self::Other { kind } => kind,
        }
    }
}
