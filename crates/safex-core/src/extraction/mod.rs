//! Entry-by-entry extraction into a destination directory.
//!
//! [`resolve`] maps validated entry paths onto the filesystem without
//! leaving the destination; [`session`] drives the per-entry state machine
//! that validates, budgets, opens and streams each entry.

pub mod resolve;
pub mod session;

pub use session::ExtractionSession;
pub use session::SessionState;
