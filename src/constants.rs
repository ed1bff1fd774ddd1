//! Application constants for SARD Explorer
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

/// Environment variable names
pub mod env {
    /// Environment variable overriding the storage root directory
    pub const STORAGE_ROOT: &str = "SARD_STORAGE_ROOT";
}

/// Storage layout constants
pub mod storage {
    /// Default storage root, relative to the working directory
    pub const DEFAULT_ROOT: &str = "storage";

    /// Directory holding third-party inputs (manifest, test-case sources)
    pub const EXTERNAL_DIR: &str = "external";

    /// Directory for intermediate artifacts
    pub const INTERIM_DIR: &str = "interim";

    /// Directory for processed datasets
    pub const PROCESSED_DIR: &str = "processed";

    /// Directory for tables and other reports
    pub const OUTPUTS_DIR: &str = "outputs";

    /// Sub-directory of the external directory holding test-case sources
    pub const TESTCASES_DIR: &str = "testcases";

    /// Conventional manifest file name inside the external directory
    pub const MANIFEST_FILE_NAME: &str = "full_manifest.xml";
}

/// Manifest vocabulary
pub mod manifest {
    /// Conventional element name of a test-case node, used in messages
    pub const TESTCASE_ELEMENT: &str = "testcase";

    /// Element name of a file node inside a test case
    pub const FILE_ELEMENT: &str = "file";

    /// Test-case status excluded by the status filter (case-sensitive)
    pub const DEPRECATED_STATUS: &str = "Deprecated";

    /// `line` attribute value meaning "no specific line"
    pub const LINE_SENTINEL: &str = "0";

    /// Path suffix of header files
    pub const HEADER_SUFFIX: &str = ".h";

    /// Test-case attribute names
    pub const ATTR_ID: &str = "id";
    pub const ATTR_STATUS: &str = "status";
    pub const ATTR_LANGUAGE: &str = "language";
    pub const ATTR_NUMBER_OF_FILES: &str = "numberOfFiles";

    /// File and annotation attribute names
    pub const ATTR_PATH: &str = "path";
    pub const ATTR_LINE: &str = "line";
    pub const ATTR_NAME: &str = "name";
}

/// Extraction defaults
pub mod extract {
    /// Languages retained by the language filter
    pub const DEFAULT_LANGUAGES: &[&str] = &["C", "C++"];

    /// Test cases with this many lines of code or more are dropped
    pub const DEFAULT_MAX_LINES_OF_CODE: usize = 1000;

    /// Test cases with this many marked lines or more are dropped
    pub const DEFAULT_MAX_MARKED_LINES: usize = 15;

    /// Concurrent source-file reads during lines-of-code enrichment
    pub const DEFAULT_LOC_CONCURRENCY: usize = 16;

    /// Test cases between debug progress log lines
    pub const PROGRESS_BATCH_SIZE: usize = 10_000;
}

/// Report and table defaults
pub mod export {
    /// Number of rows in the top-CWE table
    pub const DEFAULT_TOP_CWES: usize = 10;

    /// Histogram bin width for lines of code
    pub const LOC_BIN_WIDTH: usize = 50;

    /// Histogram bin width for marked-line counts
    pub const MARKED_LINES_BIN_WIDTH: usize = 1;

    /// Processed dataset file name
    pub const DATASET_FILE_NAME: &str = "sard_filtered.json";

    /// Table file names written to the outputs directory
    pub const FILES_FLAWED_TABLE: &str = "files_flawed.md";
    pub const FILES_TOTAL_TABLE: &str = "files_total.md";
    pub const CWE_TOP_TABLE: &str = "cwe_top.md";
    pub const CWE_ALL_TABLE: &str = "cwe_all.md";
    pub const STATS_TABLE: &str = "sard_stats.md";
}

/// Logging defaults
pub mod logging {
    /// Filter target of this crate's own events
    pub const CRATE_TARGET: &str = "sard_explorer";

    /// Level used when neither flags, `RUST_LOG` nor the config file set one
    pub const DEFAULT_LEVEL: &str = "warn";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "sard-explorer.toml";

    /// Application directory name under the user config directory
    pub const APP_DIR_NAME: &str = "sard-explorer";

    /// Configuration file name inside the application directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use env::STORAGE_ROOT as ENV_STORAGE_ROOT;
pub use extract::{DEFAULT_LANGUAGES, DEFAULT_MAX_LINES_OF_CODE, DEFAULT_MAX_MARKED_LINES};
pub use storage::MANIFEST_FILE_NAME;
