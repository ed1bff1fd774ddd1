//! Prelude module for SARD Explorer Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use sard_explorer::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sard_explorer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let layout = StorageLayout::default();
//!     let options = ExtractOptions::default().with_testcases_root(layout.testcases_path());
//!     let extraction = extract_manifest(layout.manifest_path(), options).await?;
//!     println!("{}", extraction.attrition);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    // Pipeline
    extract_from_xml,
    extract_manifest,
    AttritionReport,
    // Export
    DatasetExport,
    ExportSettings,
    ExtractOptions,
    Extraction,
    FileCountMode,
    // Data types
    LineTag,
    ManifestEntry,
    ManifestExtractor,
    ManifestReader,
    MarkedLine,
    StorageCategory,
    StorageLayout,
    SummaryRecord,
    TableExporter,
};

pub use crate::config::AppConfig;
