//! Extraction operation reporting.

use std::time::Duration;

use crate::security::BudgetUsage;

/// Outcome of validating one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// The entry passed every check.
    Safe,
    /// Path validation or the boundary check failed.
    RejectedPath {
        /// Human-readable reason.
        reason: String,
    },
    /// A byte limit was exceeded.
    RejectedBudget {
        /// Human-readable reason.
        reason: String,
    },
}

/// What happened to a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Regular file written in full.
    Extracted {
        /// Bytes written.
        bytes: u64,
    },
    /// Directory created or already present.
    DirectoryCreated,
    /// Symlink created.
    SymlinkCreated,
    /// Entry deliberately not materialized (hardlinks, devices, disabled
    /// symlinks, the root directory itself).
    Skipped {
        /// Why the entry was skipped.
        reason: String,
    },
    /// Entry refused for security reasons; nothing was left on disk.
    Rejected(ValidationVerdict),
    /// Writing the entry failed with an I/O error.
    Failed {
        /// Display form of the error.
        error: String,
    },
}

/// Per-entry record in an [`ExtractionReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    /// Raw declared path.
    pub path: String,
    /// What happened to the entry.
    pub outcome: EntryOutcome,
}

/// Aggregate status of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// No entry was rejected or failed.
    Success,
    /// Some entries were rejected or failed, at least one succeeded.
    Partial,
    /// Entries were rejected or failed and none succeeded.
    Failure,
}

/// Report of an archive extraction operation.
///
/// Contains statistics and metadata about the extraction process.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Outcome of every entry, in archive order.
    pub entries: Vec<EntryReport>,

    /// Number of files successfully extracted.
    pub files_extracted: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction operation.
    pub duration: Duration,

    /// Number of entries skipped without being treated as an error.
    pub files_skipped: usize,

    /// Number of entries rejected by a security check.
    pub entries_rejected: usize,

    /// Number of entries whose write failed.
    pub entries_failed: usize,

    /// Final byte budget counters.
    pub budget: BudgetUsage,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry outcome and updates the counters.
    pub fn record(&mut self, path: String, outcome: EntryOutcome) {
        match &outcome {
            EntryOutcome::Extracted { bytes } => {
                self.files_extracted += 1;
                self.bytes_written = self.bytes_written.saturating_add(*bytes);
            }
            EntryOutcome::DirectoryCreated => self.directories_created += 1,
            EntryOutcome::SymlinkCreated => self.symlinks_created += 1,
            EntryOutcome::Skipped { reason } => {
                self.files_skipped += 1;
                self.add_warning(format!("{path}: {reason}"));
            }
            EntryOutcome::Rejected(_) => self.entries_rejected += 1,
            EntryOutcome::Failed { .. } => self.entries_failed += 1,
        }
        self.entries.push(EntryReport { path, outcome });
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created + self.symlinks_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Aggregate status. An empty archive is a success.
    #[must_use]
    pub fn status(&self) -> ExtractionStatus {
        if self.entries_rejected + self.entries_failed == 0 {
            ExtractionStatus::Success
        } else if self.total_items() > 0 {
            ExtractionStatus::Partial
        } else {
            ExtractionStatus::Failure
        }
    }

    /// Iterates over the rejected entries and their verdicts.
    pub fn rejections(&self) -> impl Iterator<Item = (&str, &ValidationVerdict)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            EntryOutcome::Rejected(verdict) => Some((entry.path.as_str(), verdict)),
            _ => None,
        })
    }
}
