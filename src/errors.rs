//! Error types for SARD Explorer
//!
//! This module defines the error types for all components of the application.
//! Errors are designed to be actionable: each names the element, attribute,
//! test case or file involved so the user can locate the problem.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest reading and extraction errors
///
/// Every variant except `Io` describes a malformed manifest. All of them abort
/// the extraction; no partial dataset is produced.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// A required attribute is absent
    #[error("Malformed manifest: <{element}> in test case '{testcase}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: String,
        testcase: String,
    },

    /// A test-case node carries no `id` at all
    #[error("Malformed manifest: test case #{position} is missing required attribute '{attribute}'")]
    MissingTestCaseAttribute { position: usize, attribute: String },

    /// An attribute is present but cannot be interpreted
    #[error("Malformed manifest: attribute '{attribute}' of test case '{testcase}' has invalid value '{value}'")]
    InvalidAttribute {
        attribute: String,
        value: String,
        testcase: String,
    },

    /// A file node contains an element that is not a line annotation
    #[error("Malformed manifest: unknown line annotation <{tag}> in test case '{testcase}'")]
    UnknownAnnotation { tag: String, testcase: String },

    /// The document ended inside an open element
    #[error("Malformed manifest: document ended inside an open element")]
    Truncated,

    /// XML syntax error
    #[error("XML parsing error in manifest: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error reading manifest
    #[error("I/O error reading manifest")]
    Io(#[from] std::io::Error),
}

impl ManifestError {
    /// Whether this error describes a malformed manifest (as opposed to a
    /// missing or unreadable file)
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ManifestError::NotFound { .. } | ManifestError::Io(_))
    }
}

/// Storage directory errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Directory could not be created
    #[error("Failed to create storage directory {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path exists but is not a directory
    #[error("Storage path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// Table and dataset export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing an output file failed
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be written
    #[error("Failed to write configuration file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration serialization failed")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// User configuration directory unavailable
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (worth retrying without changes)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Export(ExportError::WriteFailed { .. }) | AppError::Io(_) => true,
            AppError::Manifest(ManifestError::Io(_)) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Manifest(_) => "manifest",
            AppError::Storage(_) => "storage",
            AppError::Export(_) => "export",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Export result type alias
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
