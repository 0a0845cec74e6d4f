//! Security validation modules.

pub mod boundary;
pub mod budget;
pub mod path;

// Re-export public types and functions
pub use boundary::is_path_safe;
pub use boundary::is_within;
pub use budget::BudgetUsage;
pub use budget::ByteBudget;
pub use budget::clamp_size;
pub use path::validate_entry_path;
pub use path::validate_path;
