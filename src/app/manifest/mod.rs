//! SARD manifest reading and extraction
//!
//! This module turns the SARD manifest (a large XML document describing
//! every test case, its source files and the annotated lines) into one
//! [`SummaryRecord`](crate::app::models::SummaryRecord) per retained test
//! case, along with an attrition report.
//!
//! # Key Features
//!
//! - **Streaming parsing**: one test case is materialized at a time
//! - **Ordered filter chain**: status, language, marked lines, fix lines
//! - **Lines-of-code enrichment**: deduplicated, bounded-concurrency reads
//! - **Dataset analysis**: file-count tables, CWE frequencies, histograms
//!
//! # Module Organization
//!
//! - [`types`] - Options, attrition report and extraction result
//! - [`reader`] - Pull-based XML reader yielding manifest entries
//! - [`extractor`] - Filter chain and per-test-case aggregation
//! - [`enrichment`] - Lines-of-code counting
//! - [`analysis`] - Thresholds and dataset statistics
//! - [`utils`] - End-to-end pipeline helpers
//! - [`tests`] - Integration tests for complete extractions
//!
//! # Examples
//!
//! ```rust,no_run
//! use sard_explorer::app::manifest::{extract_from_xml, ExtractOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = r#"<container>
//!   <testcase id="1" status="Accepted" language="C">
//!     <file path="000/001/a.c"><flaw line="5" name="CWE-121"/></file>
//!   </testcase>
//! </container>"#;
//!
//! let extraction = extract_from_xml(xml, ExtractOptions::unthresholded())?;
//! assert_eq!(extraction.records.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod enrichment;
pub mod extractor;
pub mod reader;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use analysis::{
    apply_thresholds, cwe_frequencies, files_flawed_table, files_total_table, histogram,
    lines_of_code_histogram, marked_lines_histogram, overview, CountRow, CweFrequency,
    DatasetOverview, HistogramBin,
};
pub use enrichment::{count_nonblank_lines, EnrichmentStats, LinesOfCodeCounter};
pub use extractor::{extract_marked_lines, ManifestExtractor};
pub use reader::ManifestReader;
pub use types::{AttritionReport, ExtractOptions, Extraction, FileCountMode};
pub use utils::{count_test_cases, extract_from_xml, extract_manifest};
