//! Tar archive source.

use std::io;
use std::io::Read;
use std::ops::ControlFlow;

use crate::Result;
use crate::types::EntryType;

use super::traits::ArchiveEntry;
use super::traits::EntrySource;
use super::traits::corrupt;

/// Tar stream reader, plain or behind a decompression layer.
///
/// Header checksums are verified by the `tar` crate as entries are read.
/// The declared path is taken from the raw header bytes (including GNU
/// long names and PAX overrides) and never sanitized here.
///
/// # Examples
///
/// ```
/// use safex_core::formats::EntrySource;
/// use safex_core::formats::TarSource;
/// use safex_core::test_utils::create_test_tar;
///
/// let data = create_test_tar([("a.txt", "hello"), ("b.txt", "world")]);
/// let count = TarSource::new(&data[..]).entry_count()?;
/// assert_eq!(count, 2);
/// # Ok::<(), safex_core::ExtractionError>(())
/// ```
pub struct TarSource<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> TarSource<R> {
    /// Wraps a tar byte stream.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            archive: tar::Archive::new(reader),
        }
    }

    fn to_entry_type(entry: &tar::Entry<'_, R>) -> EntryType {
        let header = entry.header();
        let link_target = || {
            entry
                .link_name_bytes()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default()
        };

        match header.entry_type() {
            tar::EntryType::Regular | tar::EntryType::Continuous => EntryType::File,
            tar::EntryType::Directory => EntryType::Directory,
            tar::EntryType::Symlink => EntryType::Symlink {
                target: link_target(),
            },
            tar::EntryType::Link => EntryType::Hardlink {
                target: link_target(),
            },
            tar::EntryType::Char => other("character device"),
            tar::EntryType::Block => other("block device"),
            tar::EntryType::Fifo => other("fifo"),
            tar::EntryType::GNUSparse => other("sparse file"),
            tar::EntryType::XGlobalHeader => other("pax global header"),
            _ => other("special entry"),
        }
    }
}

fn other(kind: &str) -> EntryType {
    EntryType::Other {
        kind: kind.to_string(),
    }
}

impl<R: Read> EntrySource for TarSource<R> {
    fn format_name(&self) -> &'static str {
        "tar"
    }

    fn visit_entries<F>(mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(ArchiveEntry<'_>) -> Result<ControlFlow<()>>,
    {
        for entry in self.archive.entries().map_err(|e| corrupt("tar", e))? {
            let mut entry = entry.map_err(|e| corrupt("tar", e))?;
            let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let entry_type = Self::to_entry_type(&entry);
            let declared_size = entry.size();

            let flow = visit(ArchiveEntry {
                path,
                declared_size,
                entry_type,
                reader: &mut entry,
            })?;
            if flow.is_break() {
                return Ok(());
            }
        }

        // Read past the end-of-archive blocks so a compression layer
        // reaches its trailer and checks it.
        io::copy(&mut self.archive.into_inner(), &mut io::sink())
            .map_err(|e| corrupt("tar", e))?;
        Ok(())
    }
}
