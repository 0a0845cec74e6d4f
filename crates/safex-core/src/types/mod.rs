//! Validated newtypes for extraction.
//!
//! A [`SafePath`] can only come out of [`SafePath::parse`], a [`DestDir`]
//! only from an existing, canonical, writable directory, and a
//! [`SafeSymlink`] only from a target that stays under the destination.
//! None of them implement `From` for raw strings or paths.

pub mod dest_dir;
pub mod entry_type;
pub mod safe_path;
pub mod safe_symlink;

pub use dest_dir::DestDir;
pub use entry_type::EntryType;
pub use safe_path::SafePath;
pub use safe_symlink::SafeSymlink;
