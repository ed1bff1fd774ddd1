//! SARD Explorer Library
//!
//! A Rust library for turning the NIST SARD manifest into a dataset of
//! flawed source lines: one summary record per C/C++ test case with its
//! marked lines, CWEs and source size, plus an attrition report.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_MAX_LINES_OF_CODE, 1000);
        assert_eq!(DEFAULT_MAX_MARKED_LINES, 15);
        assert_eq!(ENV_STORAGE_ROOT, "SARD_STORAGE_ROOT");
        assert_eq!(MANIFEST_FILE_NAME, "full_manifest.xml");
        assert_eq!(DEFAULT_LANGUAGES, &["C", "C++"]);
    }

    #[test]
    fn test_error_types() {
        let manifest_error = errors::ManifestError::Truncated;
        let app_error = AppError::Manifest(manifest_error);

        assert_eq!(app_error.category(), "manifest");
        assert!(!app_error.is_recoverable());
    }
}
