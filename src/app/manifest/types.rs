//! Core types for manifest extraction
//!
//! This module contains the configuration of the filter chain, the attrition
//! statistics it produces, and the combined extraction result.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::models::SummaryRecord;
use crate::constants::extract;

/// Source of `num_files_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCountMode {
    /// Number of file children of the test case
    #[default]
    Actual,
    /// The test case's `numberOfFiles` attribute
    Declared,
}

impl fmt::Display for FileCountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCountMode::Actual => f.write_str("actual"),
            FileCountMode::Declared => f.write_str("declared"),
        }
    }
}

impl FromStr for FileCountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "actual" => Ok(FileCountMode::Actual),
            "declared" => Ok(FileCountMode::Declared),
            other => Err(format!(
                "unknown file count mode '{}', expected 'actual' or 'declared'",
                other
            )),
        }
    }
}

/// Configuration of the extraction pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Languages retained by the language filter
    pub languages: BTreeSet<String>,
    /// Drop marked lines in `.h` files
    pub exclude_header_files: bool,
    /// Keep only records with fewer lines of code than this
    pub max_lines_of_code: Option<usize>,
    /// Keep only records with fewer marked lines than this
    pub max_marked_lines: Option<usize>,
    /// Count non-blank lines of the flawed files
    pub compute_lines_of_code: bool,
    /// Source of `num_files_total`
    pub file_count_mode: FileCountMode,
    /// Directory that manifest paths resolve against (required for enrichment)
    pub testcases_root: Option<PathBuf>,
    /// Concurrent source-file reads during enrichment
    pub loc_concurrency: usize,
    /// Test cases between debug progress log lines
    pub progress_batch_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            languages: extract::DEFAULT_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            exclude_header_files: true,
            max_lines_of_code: Some(extract::DEFAULT_MAX_LINES_OF_CODE),
            max_marked_lines: Some(extract::DEFAULT_MAX_MARKED_LINES),
            compute_lines_of_code: true,
            file_count_mode: FileCountMode::Actual,
            testcases_root: None,
            loc_concurrency: extract::DEFAULT_LOC_CONCURRENCY,
            progress_batch_size: extract::PROGRESS_BATCH_SIZE,
        }
    }
}

impl ExtractOptions {
    /// Options for the bare filter chain: no enrichment, no thresholds
    pub fn unthresholded() -> Self {
        Self {
            max_lines_of_code: None,
            max_marked_lines: None,
            compute_lines_of_code: false,
            ..Default::default()
        }
    }

    /// Set the directory that manifest paths resolve against
    pub fn with_testcases_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.testcases_root = Some(root.into());
        self
    }

    /// Replace the retained languages
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the given language passes the language filter
    pub fn accepts_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    /// Human-readable label of the retained languages (e.g. "C/C++")
    pub fn languages_label(&self) -> String {
        self.languages
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// How many test cases each stage removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttritionReport {
    /// Test cases in the manifest
    pub total: usize,
    /// Removed by the status filter
    pub deprecated: usize,
    /// Removed by the language filter
    pub language: usize,
    /// Removed because no marked line survived line extraction
    pub no_marked_lines: usize,
    /// Removed because a fix line was present
    pub has_fix: usize,
    /// Remaining after the lines-of-code threshold, when applied
    pub after_loc_filter: Option<usize>,
    /// Remaining after the marked-lines threshold, when applied
    pub after_marked_filter: Option<usize>,
    /// Source files that could not be read during enrichment
    pub unreadable_source_files: usize,
    /// Label of the language filter, for rendering
    pub languages_label: String,
    /// Lines-of-code threshold, for rendering
    pub max_lines_of_code: Option<usize>,
    /// Marked-lines threshold, for rendering
    pub max_marked_lines: Option<usize>,
}

impl AttritionReport {
    /// Test cases that survived the per-test-case filter chain
    pub fn retained(&self) -> usize {
        self.total
            .saturating_sub(self.deprecated)
            .saturating_sub(self.language)
            .saturating_sub(self.no_marked_lines)
            .saturating_sub(self.has_fix)
    }

    /// Test cases in the final dataset
    pub fn final_count(&self) -> usize {
        self.after_marked_filter
            .or(self.after_loc_filter)
            .unwrap_or_else(|| self.retained())
    }

    /// Total removed by any stage, thresholds included
    pub fn total_removed(&self) -> usize {
        self.total.saturating_sub(self.final_count())
    }
}

impl fmt::Display for AttritionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.total;
        writeln!(f, "SARD Total: {}", remaining)?;
        remaining = remaining.saturating_sub(self.deprecated);
        writeln!(f, "Removed deprecated: {}", remaining)?;
        remaining = remaining.saturating_sub(self.language);
        writeln!(f, "Removed non-{}: {}", self.languages_label, remaining)?;
        remaining = remaining.saturating_sub(self.no_marked_lines);
        writeln!(f, "Removed tests with no marked lines: {}", remaining)?;
        remaining = remaining.saturating_sub(self.has_fix);
        write!(f, "Removed tests with fixed lines (good cases): {}", remaining)?;

        if let (Some(max), Some(count)) = (self.max_lines_of_code, self.after_loc_filter) {
            write!(f, "\nRemoved tests with > {} loc: {}", max, count)?;
        }
        if let (Some(max), Some(count)) = (self.max_marked_lines, self.after_marked_filter) {
            write!(f, "\nRemoved tests with >={} marked lines: {}", max, count)?;
        }
        if self.unreadable_source_files > 0 {
            write!(
                f,
                "\nUnreadable source files (counted as 0 lines): {}",
                self.unreadable_source_files
            )?;
        }
        Ok(())
    }
}

/// Records that survived the filter chain and thresholds, with attrition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Retained records in manifest order
    pub records: Vec<SummaryRecord>,
    /// Per-stage removal counts
    pub attrition: AttritionReport,
}

impl Extraction {
    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was retained
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.accepts_language("C"));
        assert!(options.accepts_language("C++"));
        assert!(!options.accepts_language("Java"));
        assert!(!options.accepts_language("c"));
        assert!(options.exclude_header_files);
        assert_eq!(options.max_lines_of_code, Some(1000));
        assert_eq!(options.max_marked_lines, Some(15));
        assert_eq!(options.file_count_mode, FileCountMode::Actual);
        assert_eq!(options.languages_label(), "C/C++");
    }

    #[test]
    fn test_file_count_mode_parsing() {
        assert_eq!("actual".parse::<FileCountMode>(), Ok(FileCountMode::Actual));
        assert_eq!(
            "Declared".parse::<FileCountMode>(),
            Ok(FileCountMode::Declared)
        );
        assert!("both".parse::<FileCountMode>().is_err());
    }

    /// Test the attrition report rendering.
    ///
    /// Purpose: Verifies that each line shows the count remaining after the
    /// stage, not the count removed by it.
    /// Benefit: Keeps the report comparable with earlier runs of the analysis.
    #[test]
    fn test_attrition_report_rendering() {
        let report = AttritionReport {
            total: 100,
            deprecated: 10,
            language: 20,
            no_marked_lines: 5,
            has_fix: 15,
            after_loc_filter: Some(40),
            after_marked_filter: Some(35),
            unreadable_source_files: 0,
            languages_label: "C/C++".to_string(),
            max_lines_of_code: Some(1000),
            max_marked_lines: Some(15),
        };

        let rendered = report.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "SARD Total: 100",
                "Removed deprecated: 90",
                "Removed non-C/C++: 70",
                "Removed tests with no marked lines: 65",
                "Removed tests with fixed lines (good cases): 50",
                "Removed tests with > 1000 loc: 40",
                "Removed tests with >=15 marked lines: 35",
            ]
        );
        assert_eq!(report.retained(), 50);
        assert_eq!(report.final_count(), 35);
        assert_eq!(report.total_removed(), 65);
    }

    #[test]
    fn test_attrition_report_without_thresholds() {
        let report = AttritionReport {
            total: 3,
            deprecated: 1,
            languages_label: "C".to_string(),
            ..Default::default()
        };

        let rendered = report.to_string();
        assert_eq!(rendered.lines().count(), 5);
        assert!(!rendered.contains("loc"));
        assert_eq!(report.final_count(), 2);
    }
}
