//! Codec-facing traits for archive formats.

use std::io;
use std::io::Read;
use std::ops::ControlFlow;

use crate::ExtractionError;
use crate::Result;
use crate::types::EntryType;

/// One archive entry as declared by the codec.
///
/// Every field is untrusted. `reader` yields the decompressed entry data
/// and is only valid for the duration of the visitor call.
pub struct ArchiveEntry<'a> {
    /// Raw declared path.
    pub path: String,
    /// Declared uncompressed size.
    pub declared_size: u64,
    /// Declared entry kind.
    pub entry_type: EntryType,
    /// Decompressed data stream.
    pub reader: &'a mut dyn Read,
}

impl std::fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("declared_size", &self.declared_size)
            .field("entry_type", &self.entry_type)
            .finish_non_exhaustive()
    }
}

/// A readable archive that hands its entries, in order, to a visitor.
///
/// Tar streams can only be walked once, so every operation consumes the
/// source.
pub trait EntrySource {
    /// Archive format name.
    fn format_name(&self) -> &'static str;

    /// Calls `visit` once per entry in archive order.
    ///
    /// Returning `ControlFlow::Break` from the visitor stops the walk early.
    ///
    /// # Errors
    ///
    /// `CorruptArchive` if the container cannot be parsed, or the first
    /// error returned by `visit`.
    fn visit_entries<F>(self, visit: F) -> Result<()>
    where
        Self: Sized,
        F: FnMut(ArchiveEntry<'_>) -> Result<ControlFlow<()>>;

    /// Counts entries without writing anything.
    ///
    /// # Errors
    ///
    /// `CorruptArchive` if the container cannot be parsed.
    fn entry_count(self) -> Result<usize>
    where
        Self: Sized,
    {
        let mut count = 0usize;
        self.visit_entries(|_| {
            count += 1;
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(count)
    }

    /// Reads every entry to the end, discarding the data, so that codec
    /// checksums are verified.
    ///
    /// # Errors
    ///
    /// `CorruptArchive` on any structural or checksum failure.
    fn validate(self) -> Result<()>
    where
        Self: Sized,
    {
        self.visit_entries(|entry| {
            io::copy(entry.reader, &mut io::sink()).map_err(|e| {
                ExtractionError::CorruptArchive(format!("{}: {e}", entry.path))
            })?;
            Ok(ControlFlow::Continue(()))
        })
    }
}

pub(crate) fn corrupt(format: &str, err: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::CorruptArchive(format!("{format}: {err}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct VecSource(Vec<(&'static str, &'static str)>);

    impl EntrySource for VecSource {
        fn format_name(&self) -> &'static str {
            "vec"
        }

        fn visit_entries<F>(self, mut visit: F) -> Result<()>
        where
            F: FnMut(ArchiveEntry<'_>) -> Result<ControlFlow<()>>,
        {
            for (path, data) in self.0 {
                let mut reader = data.as_bytes();
                let flow = visit(ArchiveEntry {
                    path: path.to_string(),
                    declared_size: data.len() as u64,
                    entry_type: EntryType::File,
                    reader: &mut reader,
                })?;
                if flow.is_break() {
                    break;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_entry_count() {
        let source = VecSource(vec![("a", "1"), ("b", "22")]);
        assert_eq!(source.format_name(), "vec");
        assert_eq!(source.entry_count().unwrap(), 2);
    }

    #[test]
    fn test_default_validate() {
        let source = VecSource(vec![("a", "1")]);
        assert!(source.validate().is_ok());
    }

    #[test]
    fn test_visitor_break_stops_walk() {
        let source = VecSource(vec![("a", ""), ("b", ""), ("c", "")]);
        let mut seen = Vec::new();
        source
            .visit_entries(|entry| {
                seen.push(entry.path);
                Ok(ControlFlow::Break(()))
            })
            .unwrap();
        assert_eq!(seen, vec!["a".to_string()]);
    }
}
