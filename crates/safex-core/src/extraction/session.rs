//! Per-archive extraction state machine.

use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::time::Instant;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::ExtractionError;
use crate::Result;
use crate::SecurityConfig;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_budget;
use crate::formats::ArchiveEntry;
use crate::io::FileTable;
use crate::report::EntryOutcome;
use crate::report::ExtractionReport;
use crate::report::ValidationVerdict;
use crate::security::ByteBudget;
use crate::security::validate_path;
use crate::types::DestDir;
use crate::types::EntryType;
use crate::types::SafePath;

use super::resolve;

/// Where a session is in its lifecycle.
///
/// `Validating` through `Closing` are the per-entry phases; a session
/// returns to `Init` between entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for the next entry.
    Init,
    /// Checking the declared path and its resolution.
    Validating,
    /// Checking the declared size against the budget.
    SizeChecking,
    /// Creating parents and opening the output file.
    Opening,
    /// Copying entry data.
    Streaming,
    /// Closing the output file.
    Closing,
    /// Finished normally.
    Done,
    /// Stopped by a fatal error or an abort request.
    Aborted,
}

/// Extraction of one archive into one destination.
///
/// The session owns the byte budget and the file table; neither outlives
/// it. The codec driver calls [`process_entry`](Self::process_entry) once
/// per entry in archive order and then [`finish`](Self::finish).
///
/// Per-entry security failures are recorded as rejections and extraction
/// continues, unless `abort_on_rejection` is set. Write failures are
/// recorded as failed entries. Only a corrupt container aborts the
/// session unconditionally.
///
/// # Examples
///
/// ```no_run
/// use safex_core::SecurityConfig;
/// use safex_core::extraction::ExtractionSession;
/// use safex_core::formats::ArchiveSource;
/// use safex_core::formats::EntrySource;
/// use safex_core::types::DestDir;
/// use std::ops::ControlFlow;
/// use std::path::Path;
///
/// # fn main() -> Result<(), safex_core::ExtractionError> {
/// let dest = DestDir::new("/tmp/out")?;
/// let mut session = ExtractionSession::new(dest, SecurityConfig::default());
///
/// ArchiveSource::open(Path::new("archive.tar.gz"))?.visit_entries(|entry| {
///     session.process_entry(entry)?;
///     Ok(ControlFlow::Continue(()))
/// })?;
///
/// let report = session.finish();
/// println!("{:?}", report.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExtractionSession {
    dest: DestDir,
    config: SecurityConfig,
    budget: ByteBudget,
    files: FileTable,
    buffer: Box<CopyBuffer>,
    report: ExtractionReport,
    state: SessionState,
    started: Instant,
}

impl ExtractionSession {
    /// Starts a session rooted at `dest`.
    #[must_use]
    pub fn new(dest: DestDir, config: SecurityConfig) -> Self {
        info!(
            dest = %dest.as_path().display(),
            max_entry_bytes = config.max_entry_bytes,
            max_extracted_bytes = config.max_extracted_bytes,
            "starting extraction session"
        );

        Self {
            budget: ByteBudget::from_config(&config),
            dest,
            config,
            files: FileTable::new(),
            buffer: Box::default(),
            report: ExtractionReport::new(),
            state: SessionState::Init,
            started: Instant::now(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Budget counters so far.
    #[must_use]
    pub const fn budget(&self) -> &ByteBudget {
        &self.budget
    }

    /// Report so far.
    #[must_use]
    pub const fn report(&self) -> &ExtractionReport {
        &self.report
    }

    /// Runs the validation and size checks for an entry without creating
    /// anything or charging the budget.
    #[must_use]
    pub fn preflight(&self, path: &str, declared_size: u64) -> ValidationVerdict {
        let checked = validate_path(path, &self.config)
            .and_then(|safe| {
                if safe.is_root() {
                    Ok(())
                } else {
                    resolve::resolve_directory(&self.dest, &safe).map(drop)
                }
            })
            .and_then(|()| self.budget.add_entry_size(declared_size));

        match checked {
            Ok(()) => ValidationVerdict::Safe,
            Err(e) => verdict_for(&e),
        }
    }

    /// Processes one archive entry.
    ///
    /// Returns the outcome recorded for the entry.
    ///
    /// # Errors
    ///
    /// - `CorruptArchive` if the entry stream cannot be read; the partial
    ///   file is removed and the session is aborted
    /// - the rejection error itself when `abort_on_rejection` is set
    /// - `Io` if the session was already aborted
    pub fn process_entry(&mut self, entry: ArchiveEntry<'_>) -> Result<EntryOutcome> {
        if self.state == SessionState::Aborted {
            return Err(ExtractionError::Io(std::io::Error::other(
                "extraction session was aborted",
            )));
        }

        let path = entry.path.clone();
        let result = self.step(entry);
        self.state = SessionState::Init;

        let outcome = match result {
            Ok(outcome) => {
                if let EntryOutcome::Skipped { reason } = &outcome {
                    warn!(path = %path, reason = %reason, "skipping entry");
                }
                outcome
            }
            Err(e) if e.is_recoverable() => {
                warn!(path = %path, error = %e, "rejected entry");
                self.report
                    .record(path.clone(), EntryOutcome::Rejected(verdict_for(&e)));
                if self.config.abort_on_rejection {
                    error!(path = %path, "aborting extraction on rejection");
                    self.state = SessionState::Aborted;
                    return Err(e);
                }
                return Ok(EntryOutcome::Rejected(verdict_for(&e)));
            }
            Err(ExtractionError::Io(e)) => {
                warn!(path = %path, error = %e, "failed to write entry");
                EntryOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Err(e) => {
                error!(path = %path, error = %e, "aborting extraction");
                self.state = SessionState::Aborted;
                return Err(e);
            }
        };

        self.report.record(path, outcome.clone());
        Ok(outcome)
    }

    /// Ends the session and returns the final report.
    #[must_use]
    pub fn finish(mut self) -> ExtractionReport {
        if self.state != SessionState::Aborted {
            self.state = SessionState::Done;
        }
        self.report.duration = self.started.elapsed();
        self.report.budget = self.budget.free();

        info!(
            files = self.report.files_extracted,
            directories = self.report.directories_created,
            rejected = self.report.entries_rejected,
            bytes = self.report.bytes_written,
            status = ?self.report.status(),
            "extraction finished"
        );
        self.report
    }

    /// Stops the session early. Entries already written stay on disk.
    #[must_use]
    pub fn abort(mut self) -> ExtractionReport {
        warn!(
            entries = self.report.entries.len(),
            "extraction session aborted"
        );
        self.state = SessionState::Aborted;
        self.finish()
    }

    fn step(&mut self, entry: ArchiveEntry<'_>) -> Result<EntryOutcome> {
        self.state = SessionState::Validating;
        let safe = validate_path(&entry.path, &self.config)?;

        match entry.entry_type {
            EntryType::File => self.extract_file(&safe, entry.declared_size, entry.reader),
            EntryType::Directory => self.extract_directory(&safe),
            EntryType::Symlink { target } => self.extract_symlink(&safe, &target),
            EntryType::Hardlink { .. } => Ok(EntryOutcome::Skipped {
                reason: "hardlink entries are not extracted".to_string(),
            }),
            EntryType::Other { kind } => Ok(EntryOutcome::Skipped {
                reason: format!("{kind} entries are not extracted"),
            }),
        }
    }

    fn extract_file(
        &mut self,
        safe: &SafePath,
        declared_size: u64,
        reader: &mut dyn Read,
    ) -> Result<EntryOutcome> {
        resolve::resolve_entry(&self.dest, safe)?;

        self.state = SessionState::SizeChecking;
        self.budget.start_entry();
        self.budget.add_entry_size(declared_size)?;

        self.state = SessionState::Opening;
        let target = resolve::create_parents(&self.dest, safe)?.join(file_name(safe)?);
        let handle = self.files.open(&target, true)?;

        self.state = SessionState::Streaming;
        let streamed = self.files.file_mut(handle).and_then(|file| {
            copy_with_budget(reader, file, &mut self.budget, &mut self.buffer)
        });

        self.state = SessionState::Closing;
        let closed = self.files.close(handle);

        match streamed.and_then(|bytes| closed.map(|()| bytes)) {
            Ok(bytes) => {
                debug!(path = %target.display(), bytes, "extracted file");
                Ok(EntryOutcome::Extracted { bytes })
            }
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&target) {
                    warn!(
                        path = %target.display(),
                        error = %remove_err,
                        "failed to remove partial file"
                    );
                }
                Err(e)
            }
        }
    }

    fn extract_directory(&mut self, safe: &SafePath) -> Result<EntryOutcome> {
        if safe.is_root() {
            return Ok(EntryOutcome::Skipped {
                reason: "entry names the destination root".to_string(),
            });
        }

        resolve::resolve_directory(&self.dest, safe)?;
        self.state = SessionState::Opening;
        let created = resolve::create_directory(&self.dest, safe)?;
        debug!(path = %created.display(), "directory entry");
        Ok(EntryOutcome::DirectoryCreated)
    }

    #[cfg(unix)]
    fn extract_symlink(&mut self, safe: &SafePath, target: &str) -> Result<EntryOutcome> {
        use crate::types::SafeSymlink;

        if !self.config.allow_symlinks {
            return Ok(EntryOutcome::Skipped {
                reason: "symlink entries are disabled".to_string(),
            });
        }

        resolve::resolve_entry(&self.dest, safe)?;
        self.state = SessionState::Opening;
        let parent = resolve::create_parents(&self.dest, safe)?;
        let link = SafeSymlink::validate(safe, target, &parent, &self.dest, &self.config)?;

        let link_path = parent.join(file_name(safe)?);
        std::os::unix::fs::symlink(link.target_path(), &link_path)?;
        debug!(
            path = %link_path.display(),
            target = %link.target_path().display(),
            "created symlink"
        );
        Ok(EntryOutcome::SymlinkCreated)
    }

    #[cfg(not(unix))]
    fn extract_symlink(&mut self, _safe: &SafePath, _target: &str) -> Result<EntryOutcome> {
        Ok(EntryOutcome::Skipped {
            reason: "symlink entries are not supported on this platform".to_string(),
        })
    }
}

fn file_name(safe: &SafePath) -> Result<&OsStr> {
    safe.as_path()
        .file_name()
        .ok_or_else(|| ExtractionError::InvalidPath {
            path: safe.as_path().display().to_string(),
            reason: "entry names the destination root".to_string(),
        })
}

fn verdict_for(err: &ExtractionError) -> ValidationVerdict {
    let reason = err.to_string();
    if err.is_budget_violation() {
        ValidationVerdict::RejectedBudget { reason }
    } else {
        ValidationVerdict::RejectedPath { reason }
    }
}
