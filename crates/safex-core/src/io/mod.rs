//! Filesystem I/O for extraction.
//!
//! Everything that creates files under the destination goes through
//! [`FileTable`], which opens with symlink following disabled.

pub mod opener;

// Re-export main types for convenience
pub use opener::FileHandle;
pub use opener::FileTable;
pub use opener::open_file;
