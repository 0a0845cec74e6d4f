//! Security configuration for archive extraction.

/// Default maximum entry path length in bytes.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 4096;

/// Security configuration with default-deny settings.
///
/// Byte limits use `0` to mean "no limit", matching the semantics of
/// [`ByteBudget`](crate::security::ByteBudget).
///
/// # Examples
///
/// ```
/// use safex_core::SecurityConfig;
///
/// // Use secure defaults
/// let config = SecurityConfig::default();
///
/// // Customize for specific needs
/// let custom = SecurityConfig {
///     max_entry_bytes: 100 * 1024 * 1024,    // 100 MB
///     max_extracted_bytes: 1024 * 1024 * 1024, // 1 GB
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Maximum bytes written for a single entry (0 = unlimited).
    pub max_entry_bytes: u64,

    /// Maximum bytes written across the whole archive (0 = unlimited).
    pub max_extracted_bytes: u64,

    /// Maximum length of a declared entry path in bytes.
    pub max_path_length: usize,

    /// Extract symlink entries whose target stays inside the destination.
    pub allow_symlinks: bool,

    /// Abort the whole session on the first rejected entry.
    pub abort_on_rejection: bool,
}

impl Default for SecurityConfig {
    /// Creates a `SecurityConfig` with secure default settings.
    ///
    /// Default values:
    /// - `max_entry_bytes`: 50 MB
    /// - `max_extracted_bytes`: 500 MB
    /// - `max_path_length`: 4096
    /// - `allow_symlinks`: false (deny)
    /// - `abort_on_rejection`: false
    fn default() -> Self {
        Self {
            max_entry_bytes: 50 * 1024 * 1024,      // 50 MB
            max_extracted_bytes: 500 * 1024 * 1024, // 500 MB
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            allow_symlinks: false,
            abort_on_rejection: false,
        }
    }
}

impl SecurityConfig {
    /// Creates a configuration without byte limits for trusted archives.
    ///
    /// Path validation and boundary checks stay active.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_entry_bytes: 0,
            max_extracted_bytes: 0,
            ..Default::default()
        }
    }

    /// Sets both byte limits.
    #[must_use]
    pub fn with_limits(mut self, max_entry_bytes: u64, max_extracted_bytes: u64) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self.max_extracted_bytes = max_extracted_bytes;
        self
    }

    /// Enables or disables symlink entries.
    #[must_use]
    pub fn with_symlinks(mut self, allow: bool) -> Self {
        self.allow_symlinks = allow;
        self
    }

    /// Enables or disables aborting on the first rejection.
    #[must_use]
    pub fn with_abort_on_rejection(mut self, abort: bool) -> Self {
        self.abort_on_rejection = abort;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SecurityConfig::default();
        assert!(!config.allow_symlinks);
        assert!(!config.abort_on_rejection);
        assert_eq!(config.max_entry_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_path_length, 4096);
    }

    #[test]
    fn test_unlimited_config() {
        let config = SecurityConfig::unlimited();
        assert_eq!(config.max_entry_bytes, 0);
        assert_eq!(config.max_extracted_bytes, 0);
        assert_eq!(config.max_path_length, DEFAULT_MAX_PATH_LENGTH);
    }

    #[test]
    fn test_builder_methods() {
        let config = SecurityConfig::default()
            .with_limits(100, 1000)
            .with_symlinks(true)
            .with_abort_on_rejection(true);
        assert_eq!(config.max_entry_bytes, 100);
        assert_eq!(config.max_extracted_bytes, 1000);
        assert!(config.allow_symlinks);
        assert!(config.abort_on_rejection);
    }
}
