//! ZIP archive source.

use std::io::Read;
use std::io::Seek;
use std::ops::ControlFlow;

use crate::Result;
use crate::config::DEFAULT_MAX_PATH_LENGTH;
use crate::types::EntryType;

use super::traits::ArchiveEntry;
use super::traits::EntrySource;
use super::traits::corrupt;

/// ZIP archive reader.
///
/// The central directory is parsed on construction. Entry data is
/// decompressed lazily and CRC-32 is verified by the `zip` crate when an
/// entry is read to the end. Names are passed on raw: `ZipFile::name`, not
/// the sanitized `enclosed_name`, so rejection stays with the validators.
pub struct ZipSource<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Parses the central directory of a ZIP archive.
    ///
    /// # Errors
    ///
    /// `CorruptArchive` if the central directory is missing or malformed.
    pub fn new(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader).map_err(|e| corrupt("zip", e))?;
        Ok(Self { archive })
    }

    /// Reads a symlink target, which ZIP stores as the entry data.
    fn read_link_target(file: &mut zip::read::ZipFile<'_, R>) -> Result<String> {
        let mut target = Vec::new();
        file.by_ref()
            .take(DEFAULT_MAX_PATH_LENGTH as u64 + 1)
            .read_to_end(&mut target)
            .map_err(|e| corrupt("zip", e))?;
        Ok(String::from_utf8_lossy(&target).into_owned())
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn format_name(&self) -> &'static str {
        "zip"
    }

    fn visit_entries<F>(mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(ArchiveEntry<'_>) -> Result<ControlFlow<()>>,
    {
        for index in 0..self.archive.len() {
            let mut file = self
                .archive
                .by_index(index)
                .map_err(|e| corrupt("zip", e))?;
            let path = file.name().to_string();
            let declared_size = file.size();

            let mut empty = std::io::empty();
            let flow = if file.is_symlink() {
                let target = Self::read_link_target(&mut file)?;
                visit(ArchiveEntry {
                    path,
                    declared_size,
                    entry_type: EntryType::Symlink { target },
                    reader: &mut empty,
                })?
            } else {
                let entry_type = if file.is_dir() {
                    EntryType::Directory
                } else {
                    EntryType::File
                };
                visit(ArchiveEntry {
                    path,
                    declared_size,
                    entry_type,
                    reader: &mut file,
                })?
            };

            if flow.is_break() {
                break;
            }
        }

        Ok(())
    }

    fn entry_count(self) -> Result<usize> {
        Ok(self.archive.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use crate::test_utils::ZipTestBuilder;
    use std::io::Cursor;

    fn source(data: Vec<u8>) -> ZipSource<Cursor<Vec<u8>>> {
        ZipSource::new(Cursor::new(data)).unwrap()
    }

    #[test]
    fn test_visit_entries() {
        let data = ZipTestBuilder::new()
            .add_file("a.txt", b"hello")
            .add_directory("dir/")
            .add_symlink("link", "a.txt")
            .build();

        let mut seen = Vec::new();
        source(data)
            .visit_entries(|entry| {
                let mut buf = Vec::new();
                entry.reader.read_to_end(&mut buf).unwrap();
                seen.push((entry.path, entry.entry_type, buf));
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();

        assert_eq!(seen[0], ("a.txt".into(), EntryType::File, b"hello".to_vec()));
        assert_eq!(seen[1].1, EntryType::Directory);
        assert_eq!(
            seen[2].1,
            EntryType::Symlink {
                target: "a.txt".into()
            }
        );
    }

    #[test]
    fn test_raw_names_not_sanitized() {
        let data = ZipTestBuilder::new()
            .add_file("../../evil.sh", b"#!/bin/sh")
            .build();
        let mut names = Vec::new();
        source(data)
            .visit_entries(|entry| {
                names.push(entry.path);
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        assert_eq!(names, vec!["../../evil.sh".to_string()]);
    }

    #[test]
    fn test_entry_count_from_central_directory() {
        let data = ZipTestBuilder::new()
            .add_file("a", b"1")
            .add_file("b", b"2")
            .build();
        assert_eq!(source(data).entry_count().unwrap(), 2);
    }

    #[test]
    fn test_not_a_zip() {
        let result = ZipSource::new(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(ExtractionError::CorruptArchive(_))));
    }

    #[test]
    fn test_crc_mismatch_fails_validation() {
        let mut data = ZipTestBuilder::new().add_file("a.txt", b"hello").build();
        let offset = data
            .windows(5)
            .position(|window| window == b"hello")
            .unwrap();
        data[offset] ^= 0xff;

        let result = source(data).validate();
        assert!(matches!(result, Err(ExtractionError::CorruptArchive(_))));
    }
}
