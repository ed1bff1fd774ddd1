//! Filter chain and per-test-case aggregation
//!
//! Each test case passes through the following stages, in order; a test case
//! rejected at one stage never reaches the next:
//!
//! 1. status filter (drops `Deprecated`)
//! 2. language filter
//! 3. line extraction (merge, drop the `"0"` sentinel and optionally headers)
//! 4. emptiness filter
//! 5. fix-line filter
//! 6. aggregation into a [`SummaryRecord`]
//!
//! Lines-of-code enrichment and the numeric thresholds run afterwards over the
//! whole collection (see [`super::enrichment`] and [`super::analysis`]).

use std::collections::HashSet;

use tracing::{debug, info};

use super::types::{AttritionReport, ExtractOptions, Extraction, FileCountMode};
use crate::app::models::{LineTag, ManifestEntry, MarkedLine, SummaryRecord};
use crate::constants::manifest::{
    ATTR_NAME, ATTR_NUMBER_OF_FILES, ATTR_PATH, FILE_ELEMENT, TESTCASE_ELEMENT,
};
use crate::errors::{ManifestError, ManifestResult};

/// Runs manifest entries through the filter chain and tracks attrition
#[derive(Debug, Clone)]
pub struct ManifestExtractor {
    options: ExtractOptions,
    attrition: AttritionReport,
}

impl ManifestExtractor {
    /// Create an extractor with the given options
    pub fn new(options: ExtractOptions) -> Self {
        let attrition = AttritionReport {
            languages_label: options.languages_label(),
            ..Default::default()
        };
        Self { options, attrition }
    }

    /// Options in effect
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Attrition counted so far
    pub fn attrition(&self) -> &AttritionReport {
        &self.attrition
    }

    /// Run a single test case through the chain
    ///
    /// Returns `Ok(None)` when a filter rejected the test case.
    pub fn process(&mut self, entry: &ManifestEntry) -> ManifestResult<Option<SummaryRecord>> {
        self.attrition.total += 1;

        if entry.is_deprecated() {
            self.attrition.deprecated += 1;
            return Ok(None);
        }

        if !self.options.accepts_language(&entry.language) {
            self.attrition.language += 1;
            return Ok(None);
        }

        let markedlines = extract_marked_lines(entry, self.options.exclude_header_files)?;
        if markedlines.is_empty() {
            self.attrition.no_marked_lines += 1;
            return Ok(None);
        }

        if markedlines.iter().any(|line| line.linetag == LineTag::Fix) {
            self.attrition.has_fix += 1;
            return Ok(None);
        }

        summarize(entry, markedlines, self.options.file_count_mode).map(Some)
    }

    /// Run every entry through the chain
    ///
    /// The first error aborts the extraction; no partial result is returned.
    pub fn extract<I>(mut self, entries: I) -> ManifestResult<Extraction>
    where
        I: IntoIterator<Item = ManifestResult<ManifestEntry>>,
    {
        let batch = self.options.progress_batch_size.max(1);
        let mut records = Vec::new();

        for entry in entries {
            if let Some(record) = self.process(&entry?)? {
                records.push(record);
            }

            if self.attrition.total % batch == 0 {
                debug!(
                    "Processed {} test cases, {} retained",
                    self.attrition.total,
                    records.len()
                );
            }
        }

        info!(
            "Filter chain retained {} of {} test cases",
            records.len(),
            self.attrition.total
        );

        Ok(Extraction {
            records,
            attrition: self.attrition,
        })
    }
}

/// Merge and filter the annotated lines of a test case, in document order
///
/// Drops lines pointing at the `"0"` sentinel and, when requested, lines of
/// header files.
pub fn extract_marked_lines(
    entry: &ManifestEntry,
    exclude_header_files: bool,
) -> ManifestResult<Vec<MarkedLine>> {
    let mut markedlines = Vec::new();

    for file in &entry.files {
        for annotation in &file.lines {
            let linetag = annotation
                .tag()
                .map_err(|tag| ManifestError::UnknownAnnotation {
                    tag,
                    testcase: entry.id.clone(),
                })?;
            let line = MarkedLine::merge(file, annotation, linetag).map_err(|attribute| {
                let element = if attribute == ATTR_PATH {
                    FILE_ELEMENT
                } else {
                    annotation.element.as_str()
                };
                ManifestError::MissingAttribute {
                    element: element.to_string(),
                    attribute: attribute.to_string(),
                    testcase: entry.id.clone(),
                }
            })?;

            if line.is_sentinel() || (exclude_header_files && line.is_header()) {
                continue;
            }
            markedlines.push(line);
        }
    }

    Ok(markedlines)
}

/// Aggregate the retained marked lines of a test case
fn summarize(
    entry: &ManifestEntry,
    markedlines: Vec<MarkedLine>,
    file_count_mode: FileCountMode,
) -> ManifestResult<SummaryRecord> {
    let filepaths: Vec<String> = {
        let mut seen = HashSet::new();
        markedlines
            .iter()
            .filter(|line| seen.insert(line.path.as_str()))
            .map(|line| line.path.clone())
            .collect()
    };

    let num_files_total = match file_count_mode {
        FileCountMode::Actual => entry.files.len(),
        FileCountMode::Declared => declared_file_count(entry)?,
    };

    let cwes = markedlines
        .iter()
        .map(|line| {
            line.name
                .clone()
                .ok_or_else(|| ManifestError::MissingAttribute {
                    element: line.linetag.to_string(),
                    attribute: ATTR_NAME.to_string(),
                    testcase: entry.id.clone(),
                })
        })
        .collect::<ManifestResult<Vec<String>>>()?;

    let count = |tag: LineTag| markedlines.iter().filter(|l| l.linetag == tag).count();
    let num_flawlines = count(LineTag::Flaw);
    let num_mixedlines = count(LineTag::Mixed);
    let num_fixlines = count(LineTag::Fix);

    Ok(SummaryRecord {
        testid: entry.id.clone(),
        lang: entry.language.clone(),
        status: entry.status.clone(),
        num_markedlines: markedlines.len(),
        num_flawlines,
        num_mixedlines,
        num_fixlines,
        num_files_total,
        num_files_flawed: filepaths.len(),
        cwes,
        filepaths,
        markedlines,
        linesofcode: None,
    })
}

/// Parse the `numberOfFiles` attribute of a test case
fn declared_file_count(entry: &ManifestEntry) -> ManifestResult<usize> {
    let value = entry
        .number_of_files
        .as_deref()
        .ok_or_else(|| ManifestError::MissingAttribute {
            element: TESTCASE_ELEMENT.to_string(),
            attribute: ATTR_NUMBER_OF_FILES.to_string(),
            testcase: entry.id.clone(),
        })?;

    value
        .trim()
        .parse()
        .map_err(|_| ManifestError::InvalidAttribute {
            attribute: ATTR_NUMBER_OF_FILES.to_string(),
            value: value.to_string(),
            testcase: entry.id.clone(),
        })
}
