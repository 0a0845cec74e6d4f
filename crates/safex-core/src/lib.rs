//! Hardened archive extraction core.
//!
//! `safex-core` extracts tar (plain, gzip, bzip2, xz, zstd) and zip archives
//! while defending against path traversal ("zip-slip"), decompression
//! bombs, and symlink races between validation and file creation.
//!
//! Every entry goes through the same pipeline: its declared path is
//! validated, resolved under the destination and boundary checked; its
//! declared size is checked against a [`ByteBudget`](security::ByteBudget);
//! the output file is opened without following symlinks; and every chunk
//! written is charged to the budget. A rejected entry is recorded in the
//! [`ExtractionReport`] and extraction continues.
//!
//! # Examples
//!
//! ```no_run
//! use safex_core::ExtractionStatus;
//! use safex_core::SecurityConfig;
//! use safex_core::extract_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SecurityConfig::default();
//! let report = extract_archive("archive.tar.gz", "/output/dir", &config)?;
//! println!("Extracted {} files", report.files_extracted);
//! assert_eq!(report.status(), ExtractionStatus::Success);
//! # Ok(())
//! # }
//! ```
//!
//! The library emits [`tracing`] events and installs no subscriber.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod copy;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod io;
pub mod report;
pub mod security;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::extract_archive;
pub use api::get_entry_count;
pub use api::validate_archive;
pub use config::SecurityConfig;
pub use error::ExtractionError;
pub use error::Result;
pub use report::EntryOutcome;
pub use report::ExtractionReport;
pub use report::ExtractionStatus;
pub use report::ValidationVerdict;

// Re-export types module for easier access
pub use types::DestDir;
pub use types::EntryType;
pub use types::SafePath;
pub use types::SafeSymlink;
