//! In-memory archive fixtures.
//!
//! The builders write hostile shapes on purpose: traversal names,
//! absolute link targets, lying sizes. Names pass through the `tar` and
//! `zip` writers unchecked wherever those writers allow it, and around
//! them where they do not.
//!
//! Everything here panics on failure; it only runs inside tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io;
use std::io::Cursor;
use std::io::Write;
use tar::EntryType;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Tar archive of plain files.
///
/// ```
/// use safex_core::test_utils::create_test_tar;
///
/// let data = create_test_tar([("a.txt", "one"), ("dir/b.txt", "two")]);
/// assert_eq!(data.len() % 512, 0);
/// ```
#[must_use]
pub fn create_test_tar<'a, D: AsRef<[u8]>>(
    entries: impl IntoIterator<Item = (&'a str, D)>,
) -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for (name, data) in entries {
        builder = builder.add_file(name, data.as_ref());
    }
    builder.build()
}

/// Zip archive of stored files.
#[must_use]
pub fn create_test_zip<'a, D: AsRef<[u8]>>(
    entries: impl IntoIterator<Item = (&'a str, D)>,
) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (name, data) in entries {
        builder = builder.add_file(name, data.as_ref());
    }
    builder.build()
}

/// Gzip wrapper for `.tar.gz` fixtures.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Chained tar builder.
///
/// ```
/// use safex_core::test_utils::TarTestBuilder;
///
/// let data = TarTestBuilder::new()
///     .add_directory("dir/")
///     .add_file("dir/file.txt", b"content")
///     .add_symlink("link", "dir/file.txt")
///     .add_raw_file("../escape.txt", b"evil")
///     .build();
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Regular file, mode 0644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.append(path, EntryType::Regular, 0o644, data.len() as u64, data)
    }

    /// Regular file with `path` copied straight into the header name
    /// field, so `..` and absolute names survive. At most 100 bytes.
    #[must_use]
    pub fn add_raw_file(mut self, path: &str, data: &[u8]) -> Self {
        assert!(path.len() <= 100, "name does not fit the header: {path}");

        let mut header = header(EntryType::Regular, 0o644, data.len() as u64);
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// File whose header claims `declared` bytes; `data` is zero-padded
    /// to that length.
    #[must_use]
    pub fn add_file_declaring(self, path: &str, declared: u64, data: &[u8]) -> Self {
        let mut body = data.to_vec();
        body.resize(usize::try_from(declared).unwrap(), 0);
        self.append(path, EntryType::Regular, 0o644, declared, &body)
    }

    /// Directory, mode 0755.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.append(path, EntryType::Directory, 0o755, 0, &[])
    }

    /// Symlink; the target is stored unchecked.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.append_link(path, EntryType::Symlink, target)
    }

    /// Hardlink; the target is stored unchecked.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.append_link(path, EntryType::Link, target)
    }

    /// Finishes the archive with its zero blocks.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }

    fn append(mut self, path: &str, kind: EntryType, mode: u32, size: u64, data: &[u8]) -> Self {
        let mut header = header(kind, mode, size);
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    fn append_link(mut self, path: &str, kind: EntryType, target: &str) -> Self {
        let mut header = header(kind, 0o777, 0);
        header.set_link_name(target).unwrap();
        self.builder
            .append_data(&mut header, path, io::empty())
            .unwrap();
        self
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn header(kind: EntryType, mode: u32, size: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(kind);
    header.set_mode(mode);
    header.set_size(size);
    header
}

/// Chained zip builder. Zip names are stored as given.
///
/// ```
/// use safex_core::test_utils::ZipTestBuilder;
///
/// let data = ZipTestBuilder::new()
///     .add_file("../../evil.sh", b"#!/bin/sh")
///     .add_directory("dir/")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Stored file.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.put(path, data, CompressionMethod::Stored)
    }

    /// Deflated file, for bomb fixtures.
    #[must_use]
    pub fn add_deflated_file(self, path: &str, data: &[u8]) -> Self {
        self.put(path, data, CompressionMethod::Deflated)
    }

    /// Directory, mode 0755.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        self.zip
            .add_directory(path, SimpleFileOptions::default().unix_permissions(0o755))
            .unwrap();
        self
    }

    /// Symlink entry; `target` becomes the entry data.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        self.zip
            .add_symlink(path, target, SimpleFileOptions::default())
            .unwrap();
        self
    }

    /// Writes the central directory.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }

    fn put(mut self, path: &str, data: &[u8], method: CompressionMethod) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(0o644);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_tar_entry<T>(data: &[u8], inspect: impl FnOnce(&tar::Entry<'_, &[u8]>) -> T) -> T {
        let mut archive = tar::Archive::new(data);
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        inspect(&entry)
    }

    #[test]
    fn test_raw_file_keeps_traversal_name() {
        let data = TarTestBuilder::new()
            .add_raw_file("../../etc/passwd", b"x")
            .build();
        let name = first_tar_entry(&data, |e| e.path_bytes().into_owned());
        assert_eq!(name, b"../../etc/passwd");
    }

    #[test]
    fn test_file_declaring_pads_data() {
        let data = TarTestBuilder::new()
            .add_file_declaring("big", 1024, b"abc")
            .build();
        assert_eq!(first_tar_entry(&data, |e| e.size()), 1024);
    }

    #[test]
    fn test_link_targets_unchecked() {
        let data = TarTestBuilder::new()
            .add_symlink("s", "/etc/passwd")
            .build();
        let (kind, target) = first_tar_entry(&data, |e| {
            (
                e.header().entry_type(),
                e.link_name_bytes().map(|b| b.into_owned()),
            )
        });
        assert_eq!(kind, EntryType::Symlink);
        assert_eq!(target.as_deref(), Some(&b"/etc/passwd"[..]));
    }

    #[test]
    fn test_zip_symlink_flagged() {
        let data = ZipTestBuilder::new().add_symlink("link", "target").build();
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        assert!(archive.by_index(0).unwrap().is_symlink());
    }

    #[test]
    fn test_gzip_magic() {
        let compressed = gzip(&create_test_tar([("a", "1")]));
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }
}
