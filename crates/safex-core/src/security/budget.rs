//! Byte budget enforcement against decompression bombs.

use crate::ExtractionError;
use crate::Result;
use crate::SecurityConfig;

/// Snapshot of a budget's counters, returned by [`ByteBudget::free`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetUsage {
    /// Bytes accounted to the last entry.
    pub current_entry_bytes: u64,
    /// Bytes accounted across the session.
    pub total_bytes: u64,
}

/// Per-session accounting of decompressed bytes.
///
/// A budget enforces two ceilings: one per entry and one for the whole
/// archive. A limit of `0` disables that ceiling. Declared sizes can be
/// checked up front with [`add_entry_size`](Self::add_entry_size), but the
/// authoritative check is [`add_bytes`](Self::add_bytes), which is charged
/// for every chunk actually written.
///
/// Counters only grow until [`reset`](Self::reset); a failed `add_bytes`
/// still accounts the chunk that crossed the limit.
///
/// # Examples
///
/// ```
/// use safex_core::ExtractionError;
/// use safex_core::security::ByteBudget;
///
/// let mut budget = ByteBudget::new(100, 150);
///
/// budget.start_entry();
/// budget.add_bytes(80)?;
///
/// budget.start_entry();
/// let err = budget.add_bytes(80).unwrap_err();
/// assert!(matches!(err, ExtractionError::TotalTooLarge { total: 160, max: 150 }));
///
/// let usage = budget.free();
/// assert_eq!(usage.total_bytes, 160);
/// # Ok::<(), ExtractionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBudget {
    max_entry_bytes: u64,
    max_extracted_bytes: u64,
    current_entry_bytes: u64,
    total_bytes: u64,
}

impl ByteBudget {
    /// Creates a budget with zeroed counters.
    #[must_use]
    pub const fn new(max_entry_bytes: u64, max_extracted_bytes: u64) -> Self {
        Self {
            max_entry_bytes,
            max_extracted_bytes,
            current_entry_bytes: 0,
            total_bytes: 0,
        }
    }

    /// Creates a budget from signed limits, clamping negatives to `0`
    /// (unlimited).
    #[must_use]
    pub const fn from_signed(max_entry_bytes: i64, max_extracted_bytes: i64) -> Self {
        Self::new(clamp_size(max_entry_bytes), clamp_size(max_extracted_bytes))
    }

    /// Creates a budget from the configured limits.
    #[must_use]
    pub const fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.max_entry_bytes, config.max_extracted_bytes)
    }

    /// Begins accounting a new entry.
    pub fn start_entry(&mut self) {
        self.current_entry_bytes = 0;
    }

    /// Checks a declared size against both limits without charging it.
    ///
    /// Declared sizes come from the archive and may lie; passing this
    /// check does not exempt the entry from [`add_bytes`](Self::add_bytes).
    ///
    /// # Errors
    ///
    /// `EntryTooLarge` if the declared size alone exceeds the entry limit,
    /// otherwise `TotalTooLarge` if it would push the total past its limit.
    pub fn add_entry_size(&self, declared: u64) -> Result<()> {
        if self.max_entry_bytes != 0 && declared > self.max_entry_bytes {
            return Err(ExtractionError::EntryTooLarge {
                size: declared,
                max: self.max_entry_bytes,
            });
        }

        let projected = self.total_bytes.saturating_add(declared);
        if self.max_extracted_bytes != 0 && projected > self.max_extracted_bytes {
            return Err(ExtractionError::TotalTooLarge {
                total: projected,
                max: self.max_extracted_bytes,
            });
        }

        Ok(())
    }

    /// Charges `chunk` bytes to the current entry and the total.
    ///
    /// # Errors
    ///
    /// `EntryTooLarge` as soon as the entry counter exceeds its limit,
    /// otherwise `TotalTooLarge` as soon as the total exceeds its limit.
    pub fn add_bytes(&mut self, chunk: u64) -> Result<()> {
        self.current_entry_bytes = self.current_entry_bytes.saturating_add(chunk);
        self.total_bytes = self.total_bytes.saturating_add(chunk);

        if self.max_entry_bytes != 0 && self.current_entry_bytes > self.max_entry_bytes {
            return Err(ExtractionError::EntryTooLarge {
                size: self.current_entry_bytes,
                max: self.max_entry_bytes,
            });
        }

        if self.max_extracted_bytes != 0 && self.total_bytes > self.max_extracted_bytes {
            return Err(ExtractionError::TotalTooLarge {
                total: self.total_bytes,
                max: self.max_extracted_bytes,
            });
        }

        Ok(())
    }

    /// Zeroes both counters for reuse in a new session.
    pub fn reset(&mut self) {
        self.current_entry_bytes = 0;
        self.total_bytes = 0;
    }

    /// Bytes charged since the last [`start_entry`](Self::start_entry).
    #[must_use]
    pub const fn current_entry_bytes(&self) -> u64 {
        self.current_entry_bytes
    }

    /// Bytes charged over the session.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Per-entry limit (`0` = unlimited).
    #[must_use]
    pub const fn max_entry_bytes(&self) -> u64 {
        self.max_entry_bytes
    }

    /// Archive-wide limit (`0` = unlimited).
    #[must_use]
    pub const fn max_extracted_bytes(&self) -> u64 {
        self.max_extracted_bytes
    }

    /// Current counters without consuming the budget.
    #[must_use]
    pub const fn usage(&self) -> BudgetUsage {
        BudgetUsage {
            current_entry_bytes: self.current_entry_bytes,
            total_bytes: self.total_bytes,
        }
    }

    /// Releases the budget and returns its final counters.
    #[must_use]
    pub const fn free(self) -> BudgetUsage {
        self.usage()
    }
}

/// Converts a signed size to `u64`, mapping negatives to `0`.
#[must_use]
pub const fn clamp_size(size: i64) -> u64 {
    if size < 0 { 0 } else { size.unsigned_abs() }
}
