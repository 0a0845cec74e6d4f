//! Chunked copy of entry data with per-chunk budget accounting.
//!
//! Entry streams are copied through a fixed 64 KiB buffer. Every
//! chunk is charged to the session's [`ByteBudget`] before it is written,
//! so no byte past a limit ever reaches the destination.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::ExtractionError;
use crate::security::ByteBudget;

/// Chunk size for entry copies; also the budget accounting granularity.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reusable chunk buffer, shared by every entry of an extraction session.
#[derive(Debug)]
pub struct CopyBuffer {
    #[allow(clippy::large_stack_arrays)]
    buf: [u8; COPY_BUFFER_SIZE],
}

impl CopyBuffer {
    /// Creates a new zero-initialized copy buffer.
    #[inline]
    #[must_use]
    #[allow(clippy::large_stack_arrays)]
    pub fn new() -> Self {
        Self {
            buf: [0u8; COPY_BUFFER_SIZE],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        COPY_BUFFER_SIZE
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies an entry stream into `writer`, charging each chunk to `budget`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// - `EntryTooLarge` / `TotalTooLarge` from [`ByteBudget::add_bytes`]; the
///   offending chunk is not written
/// - `CorruptArchive` if reading the entry stream fails
/// - `Io` if writing to the destination fails
///
/// # Examples
///
/// ```
/// # use safex_core::copy::{CopyBuffer, copy_with_budget};
/// # use safex_core::security::ByteBudget;
/// # use safex_core::ExtractionError;
/// let mut budget = ByteBudget::new(4, 0);
/// let mut buffer = CopyBuffer::new();
/// let mut output = Vec::new();
///
/// let result = copy_with_budget(&mut &b"too long"[..], &mut output, &mut budget, &mut buffer);
/// assert!(matches!(result, Err(ExtractionError::EntryTooLarge { .. })));
/// assert!(output.is_empty());
/// ```
#[inline]
pub fn copy_with_budget<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    budget: &mut ByteBudget,
    buffer: &mut CopyBuffer,
) -> Result<u64, ExtractionError> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExtractionError::CorruptArchive(e.to_string())),
        };

        budget.add_bytes(bytes_read as u64)?;

        writer
            .write_all(&buffer.buf[..bytes_read])
            .map_err(ExtractionError::Io)?;

        total = total.saturating_add(bytes_read as u64);
    }

    Ok(total)
}
