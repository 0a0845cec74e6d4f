//! High-level public API for whole-archive operations.

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use tracing::debug;

use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::SecurityConfig;
use crate::extraction::ExtractionSession;
use crate::formats::ArchiveSource;
use crate::formats::EntrySource;
use crate::types::DestDir;

/// Extracts an archive to the specified output directory.
///
/// The archive format is detected from the file extension. Each entry is
/// validated, budgeted and written by an [`ExtractionSession`]; rejected
/// entries are recorded in the report and do not fail the call. The output
/// directory is created if it does not exist.
///
/// # Arguments
///
/// * `archive_path` - Path to the archive file
/// * `output_dir` - Directory where files will be extracted
/// * `config` - Security configuration for the extraction
///
/// # Errors
///
/// Returns an error if:
/// - Archive format is unsupported (`UnsupportedFormat`)
/// - Archive file or output directory cannot be opened (`Io`)
///
/// Once entries are being processed, a stop is reported as `Aborted`,
/// whose `source` is the cause (`CorruptArchive` for a damaged or
/// truncated archive, the rejection itself when `abort_on_rejection` is
/// set) and whose `report` covers every entry handled before the stop.
///
/// # Examples
///
/// ```no_run
/// use safex_core::ExtractionStatus;
/// use safex_core::SecurityConfig;
/// use safex_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SecurityConfig::default();
/// let report = extract_archive("archive.tar.gz", "/tmp/output", &config)?;
/// if report.status() != ExtractionStatus::Success {
///     for (path, verdict) in report.rejections() {
///         eprintln!("{path}: {verdict:?}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    config: &SecurityConfig,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    let output_dir = output_dir.as_ref();

    let source = ArchiveSource::open(archive_path)?;
    debug!(
        archive = %archive_path.display(),
        format = source.format_name(),
        "opened archive"
    );

    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
    }
    let dest = DestDir::new(output_dir)?;

    let mut session = ExtractionSession::new(dest, config.clone());
    let visited = source.visit_entries(|entry| {
        session.process_entry(entry)?;
        Ok(ControlFlow::Continue(()))
    });

    match visited {
        Ok(()) => Ok(session.finish()),
        Err(e) => Err(ExtractionError::Aborted {
            source: Box::new(e),
            report: Box::new(session.abort()),
        }),
    }
}

/// Counts the entries of an archive without extracting anything.
///
/// ZIP archives are counted from the central directory. Tar archives are
/// scanned header by header, skipping entry data.
///
/// # Errors
///
/// - `UnsupportedFormat` if the extension is not recognized
/// - `Io` if the file cannot be opened
/// - `CorruptArchive` if a header cannot be parsed
///
/// # Examples
///
/// ```no_run
/// use safex_core::get_entry_count;
///
/// # fn main() -> Result<(), safex_core::ExtractionError> {
/// let count = get_entry_count("archive.zip")?;
/// println!("{count} entries");
/// # Ok(())
/// # }
/// ```
pub fn get_entry_count<P: AsRef<Path>>(archive_path: P) -> Result<usize> {
    ArchiveSource::open(archive_path.as_ref())?.entry_count()
}

/// Checks that an archive can be read end to end.
///
/// Every entry is decompressed to a sink, so tar header checksums and ZIP
/// CRC-32 values are verified. Nothing is written to disk and entry paths
/// are not judged; use [`extract_archive`] for that.
///
/// Returns `Ok(false)` for a corrupt or truncated archive.
///
/// # Errors
///
/// - `UnsupportedFormat` if the extension is not recognized
/// - `Io` if the file cannot be opened
///
/// # Examples
///
/// ```no_run
/// use safex_core::validate_archive;
///
/// # fn main() -> Result<(), safex_core::ExtractionError> {
/// if !validate_archive("download.tar.xz")? {
///     eprintln!("archive is damaged");
/// }
/// # Ok(())
/// # }
/// ```
pub fn validate_archive<P: AsRef<Path>>(archive_path: P) -> Result<bool> {
    let checked = ArchiveSource::open(archive_path.as_ref()).and_then(EntrySource::validate);

    match checked {
        Ok(()) => Ok(true),
        Err(ExtractionError::CorruptArchive(reason)) => {
            debug!(reason = %reason, "archive failed validation");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
