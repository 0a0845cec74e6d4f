//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::report::ExtractionReport;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur during archive extraction.
///
/// Per-entry errors ([`is_recoverable`](Self::is_recoverable) returns
/// `true`) cause a single entry to be rejected while extraction continues.
/// The remaining variants abort the whole session.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Declared entry path is syntactically unsafe (traversal, absolute,
    /// control characters, too long).
    #[error("invalid entry path {path:?}: {reason}")]
    InvalidPath {
        /// The raw path as declared by the archive.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// Resolved path leaves the destination root.
    #[error("path escapes destination directory: {path}")]
    BoundaryEscape {
        /// The resolved path that escaped.
        path: PathBuf,
    },

    /// A single entry exceeds the per-entry byte limit.
    #[error("entry too large ({size} > {max} bytes)")]
    EntryTooLarge {
        /// Bytes declared or written for the entry.
        size: u64,
        /// Configured per-entry limit.
        max: u64,
    },

    /// Cumulative extracted bytes exceed the archive-wide limit.
    #[error("total extracted size too large ({total} > {max} bytes)")]
    TotalTooLarge {
        /// Cumulative bytes declared or written.
        total: u64,
        /// Configured archive-wide limit.
        max: u64,
    },

    /// Final path component is a symlink and following was refused.
    #[error("refusing to follow symlink: {path}")]
    SymlinkDenied {
        /// The path whose final component is a symlink.
        path: PathBuf,
    },

    /// The OS refused access to a destination path.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// The path that could not be accessed.
        path: PathBuf,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive container is unreadable or structurally invalid.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// File handle was already closed or never belonged to this table.
    #[error("stale file handle: {handle}")]
    StaleHandle {
        /// Display form of the handle.
        handle: String,
    },

    /// An extraction session stopped early. `report` accounts for every
    /// entry handled before the stop, including files left on disk.
    #[error("extraction aborted: {source}")]
    Aborted {
        /// The error that stopped the session.
        source: Box<ExtractionError>,
        /// Report of the session up to the stop.
        report: Box<ExtractionReport>,
    },
}

impl ExtractionError {
    /// Returns `true` if this error represents an attack on the extractor.
    ///
    /// # Examples
    ///
    /// ```
    /// use safex_core::ExtractionError;
    ///
    /// let err = ExtractionError::InvalidPath {
    ///     path: "../etc/passwd".into(),
    ///     reason: "parent directory component".into(),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ExtractionError::UnsupportedFormat;
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        matches!(
            self.cause(),
            Self::InvalidPath { .. }
                | Self::BoundaryEscape { .. }
                | Self::EntryTooLarge { .. }
                | Self::TotalTooLarge { .. }
                | Self::SymlinkDenied { .. }
        )
    }

    /// Returns `true` if the error only affects the current entry.
    ///
    /// Recoverable errors are recorded against the entry and extraction
    /// moves on. Non-recoverable errors abort the session.
    ///
    /// # Examples
    ///
    /// ```
    /// use safex_core::ExtractionError;
    ///
    /// let err = ExtractionError::EntryTooLarge { size: 101, max: 100 };
    /// assert!(err.is_recoverable());
    ///
    /// let err = ExtractionError::CorruptArchive("bad header".to_string());
    /// assert!(!err.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::BoundaryEscape { .. }
                | Self::EntryTooLarge { .. }
                | Self::TotalTooLarge { .. }
                | Self::SymlinkDenied { .. }
                | Self::PermissionDenied { .. }
                | Self::StaleHandle { .. }
        )
    }

    /// Returns `true` for byte budget violations.
    #[must_use]
    pub fn is_budget_violation(&self) -> bool {
        matches!(
            self.cause(),
            Self::EntryTooLarge { .. } | Self::TotalTooLarge { .. }
        )
    }

    /// The error that stopped an aborted session, or `self`.
    ///
    /// ```
    /// use safex_core::ExtractionError;
    /// use safex_core::ExtractionReport;
    ///
    /// let err = ExtractionError::Aborted {
    ///     source: Box::new(ExtractionError::CorruptArchive("eof".into())),
    ///     report: Box::new(ExtractionReport::new()),
    /// };
    /// assert!(matches!(err.cause(), ExtractionError::CorruptArchive(_)));
    /// assert!(err.report().is_some());
    /// ```
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::Aborted { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Partial report carried by an aborted session.
    #[must_use]
    pub fn report(&self) -> Option<&ExtractionReport> {
        match self {
            Self::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Small integer code for callers that marshal results across a
    /// language boundary. `0` is reserved for success.
    ///
    /// # Examples
    ///
    /// ```
    /// use safex_core::ExtractionError;
    ///
    /// assert_eq!(ExtractionError::EntryTooLarge { size: 2, max: 1 }.status_code(), 1);
    /// assert_eq!(ExtractionError::TotalTooLarge { total: 2, max: 1 }.status_code(), 2);
    /// ```
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self.cause() {
            Self::EntryTooLarge { .. } => 1,
            Self::TotalTooLarge { .. } => 2,
            Self::InvalidPath { .. } => 3,
            Self::BoundaryEscape { .. } => 4,
            Self::SymlinkDenied { .. } => 5,
            Self::PermissionDenied { .. } => 6,
            Self::Io(_) => 7,
            Self::CorruptArchive(_) => 8,
            Self::UnsupportedFormat => 9,
            Self::StaleHandle { .. } => 10,
            Self::Aborted { .. } => 11,
        }
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self.cause() {
            Self::InvalidPath { reason, .. } => Some(reason),
            Self::CorruptArchive(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Maps a `Result` onto the status-code convention (`0` = ok).
#[must_use]
pub fn status_code<T>(result: &Result<T>) -> i32 {
    result.as_ref().map_or_else(ExtractionError::status_code, |_| 0)
}
