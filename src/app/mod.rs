//! Core application logic for SARD Explorer
//!
//! This module contains the manifest data model, the extraction pipeline,
//! the storage layout and the table exporters.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sard_explorer::app::{extract_manifest, StorageLayout, TableExporter};
//! use sard_explorer::app::export::ExportSettings;
//! use sard_explorer::app::manifest::ExtractOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = StorageLayout::new("storage");
//! let options = ExtractOptions::default().with_testcases_root(layout.testcases_path());
//!
//! let extraction = extract_manifest(layout.manifest_path(), options).await?;
//! println!("{}", extraction.attrition);
//!
//! let exporter = TableExporter::new(layout, ExportSettings::default());
//! exporter.write_tables(&extraction).await?;
//! exporter.write_dataset(&extraction).await?;
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod manifest;
pub mod models;
pub mod storage;

// Re-export main public API
pub use export::{DatasetExport, ExportSettings, TableExporter};
pub use manifest::{
    extract_from_xml, extract_manifest, AttritionReport, ExtractOptions, Extraction,
    FileCountMode, ManifestExtractor, ManifestReader,
};
pub use models::{FileEntry, LineAnnotation, LineTag, ManifestEntry, MarkedLine, SummaryRecord};
pub use storage::{StorageCategory, StorageLayout};
