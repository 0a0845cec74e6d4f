//! Decompression layers for tar streams.
//!
//! - **Gzip** (.tar.gz, .tgz)
//! - **Bzip2** (.tar.bz2, .tbz, .tbz2)
//! - **Xz** (.tar.xz, .txz)
//! - **Zstd** (.tar.zst, .tzst)

use std::io::Read;

use crate::ExtractionError;
use crate::Result;

/// Compression codec wrapped around a tar stream.
///
/// Decoders are streaming: decompressed bytes are produced on demand as
/// the tar reader pulls them, so a compression bomb is only ever inflated
/// as far as the byte budget lets the copy loop read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    /// Gzip (deflate), via `flate2`.
    Gzip,

    /// Bzip2, via `bzip2`.
    Bzip2,

    /// Xz (LZMA2), via `xz2`.
    Xz,

    /// Zstandard, via `zstd`.
    Zstd,
}

impl CompressionCodec {
    /// Wraps `reader` in the matching streaming decoder.
    ///
    /// # Errors
    ///
    /// Returns `CorruptArchive` if the decoder cannot be initialized.
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Self::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(reader).map_err(|e| {
                ExtractionError::CorruptArchive(format!("zstd stream: {e}"))
            })?),
        })
    }

    /// Returns a human-readable name for this codec.
    ///
    /// # Examples
    ///
    /// ```
    /// use safex_core::formats::compression::CompressionCodec;
    ///
    /// assert_eq!(CompressionCodec::Gzip.name(), "gzip");
    /// assert_eq!(CompressionCodec::Bzip2.name(), "bzip2");
    /// ```
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}
