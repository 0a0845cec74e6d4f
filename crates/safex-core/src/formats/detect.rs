//! Archive format detection.

use std::path::Path;

use crate::ExtractionError;
use crate::Result;

use super::compression::CompressionCodec;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Bzip2-compressed tar archive.
    TarBz2,
    /// XZ-compressed tar archive.
    TarXz,
    /// Zstd-compressed tar archive.
    TarZst,
    /// ZIP archive.
    Zip,
}

impl ArchiveType {
    /// Compression layer wrapped around a tar stream, if any.
    #[must_use]
    pub const fn codec(self) -> Option<CompressionCodec> {
        match self {
            Self::TarGz => Some(CompressionCodec::Gzip),
            Self::TarBz2 => Some(CompressionCodec::Bzip2),
            Self::TarXz => Some(CompressionCodec::Xz),
            Self::TarZst => Some(CompressionCodec::Zstd),
            Self::Tar | Self::Zip => None,
        }
    }

    /// Short lowercase name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        }
    }
}

/// Detects the archive type from a file path's extension.
///
/// Matching is case-insensitive. Compressed single files (`.gz` without a
/// tar inside) are not distinguished; a non-tar payload surfaces as a
/// corrupt archive when read.
///
/// # Errors
///
/// Returns `UnsupportedFormat` if the extension is missing or unknown.
pub fn detect_format(path: &Path) -> Result<ArchiveType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or(ExtractionError::UnsupportedFormat)?;

    let ext_lower = extension.to_ascii_lowercase();
    match ext_lower.as_str() {
        "tar" => Ok(ArchiveType::Tar),
        "gz" | "tgz" => Ok(ArchiveType::TarGz),
        "bz2" | "tbz" | "tbz2" => Ok(ArchiveType::TarBz2),
        "xz" | "txz" => Ok(ArchiveType::TarXz),
        "zst" | "tzst" => Ok(ArchiveType::TarZst),
        "zip" => Ok(ArchiveType::Zip),
        _ => Err(ExtractionError::UnsupportedFormat),
    }
}
