//! Archive format implementations.

pub mod compression;
pub mod detect;
pub mod tar;
pub mod traits;
pub mod zip;

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::ops::ControlFlow;
use std::path::Path;

use crate::Result;

// Re-export main types for convenience
pub use detect::ArchiveType;
pub use detect::detect_format;
pub use tar::TarSource;
pub use traits::ArchiveEntry;
pub use traits::EntrySource;
pub use zip::ZipSource;

/// Any supported archive opened from disk, with its format chosen by
/// [`detect_format`].
pub enum ArchiveSource {
    /// Tar, possibly behind a decompression layer.
    Tar(TarSource<Box<dyn Read>>),
    /// ZIP.
    Zip(ZipSource<BufReader<File>>),
}

impl ArchiveSource {
    /// Opens an archive file for reading.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if the extension is not recognized
    /// - `Io` if the file cannot be opened
    /// - `CorruptArchive` if the container header cannot be parsed
    pub fn open(path: &Path) -> Result<Self> {
        let format = detect_format(path)?;
        let reader = BufReader::new(File::open(path)?);

        match format {
            ArchiveType::Zip => Ok(Self::Zip(ZipSource::new(reader)?)),
            _ => {
                let stream: Box<dyn Read> = match format.codec() {
                    Some(codec) => codec.decoder(reader)?,
                    None => Box::new(reader),
                };
                Ok(Self::Tar(TarSource::new(stream)))
            }
        }
    }
}

impl EntrySource for ArchiveSource {
    fn format_name(&self) -> &'static str {
        match self {
            Self::Tar(source) => source.format_name(),
            Self::Zip(source) => source.format_name(),
        }
    }

    fn visit_entries<F>(self, visit: F) -> Result<()>
    where
        F: FnMut(ArchiveEntry<'_>) -> Result<ControlFlow<()>>,
    {
        match self {
            Self::Tar(source) => source.visit_entries(visit),
            Self::Zip(source) => source.visit_entries(visit),
        }
    }

    fn entry_count(self) -> Result<usize> {
        match self {
            Self::Tar(source) => source.entry_count(),
            Self::Zip(source) => source.entry_count(),
        }
    }
}
