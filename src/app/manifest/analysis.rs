//! Dataset analysis over extracted summary records
//!
//! This module applies the post-aggregation thresholds and derives the tables
//! used to describe the final dataset: file-count distributions, CWE
//! frequencies and histograms.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, warn};

use super::types::{AttritionReport, ExtractOptions};
use crate::app::models::SummaryRecord;

/// Apply the lines-of-code and marked-line thresholds to the whole collection
///
/// The lines-of-code threshold only applies when `enriched` is set, i.e. when
/// every record carries a line count. Remaining counts after each threshold
/// are written into `attrition`.
pub fn apply_thresholds(
    mut records: Vec<SummaryRecord>,
    options: &ExtractOptions,
    enriched: bool,
    attrition: &mut AttritionReport,
) -> Vec<SummaryRecord> {
    if let Some(max_loc) = options.max_lines_of_code {
        if enriched {
            records.retain(|record| record.linesofcode.map_or(true, |loc| loc < max_loc));
            attrition.max_lines_of_code = Some(max_loc);
            attrition.after_loc_filter = Some(records.len());
        } else {
            warn!(
                "Ignoring lines-of-code threshold ({}) because lines of code were not computed",
                max_loc
            );
        }
    }

    if let Some(max_marked) = options.max_marked_lines {
        records.retain(|record| record.num_markedlines < max_marked);
        attrition.max_marked_lines = Some(max_marked);
        attrition.after_marked_filter = Some(records.len());
    }

    info!("{} records remain after thresholds", records.len());
    records
}

/// Number of test cases sharing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountRow {
    /// The grouped value (e.g. a file count)
    pub value: usize,
    /// Test cases with that value
    pub test_cases: usize,
}

/// Occurrences of a CWE across all marked lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CweFrequency {
    pub cwe: String,
    pub total: usize,
}

/// One histogram bin covering `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub start: usize,
    pub end: usize,
    pub count: usize,
}

/// Headline numbers of a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub test_cases: usize,
    pub marked_lines: usize,
    pub flaw_lines: usize,
    pub mixed_lines: usize,
    pub flawed_files: usize,
    pub distinct_cwes: usize,
    /// Sum of lines of code, when computed
    pub lines_of_code: Option<usize>,
}

fn group_counts<F>(records: &[SummaryRecord], key: F) -> BTreeMap<usize, usize>
where
    F: Fn(&SummaryRecord) -> usize,
{
    let mut groups = BTreeMap::new();
    for record in records {
        *groups.entry(key(record)).or_insert(0) += 1;
    }
    groups
}

/// Test cases per number of flawed files, ordered by file count
pub fn files_flawed_table(records: &[SummaryRecord]) -> Vec<CountRow> {
    group_counts(records, |record| record.num_files_flawed)
        .into_iter()
        .map(|(value, test_cases)| CountRow { value, test_cases })
        .collect()
}

/// Test cases per total number of files, most common first
pub fn files_total_table(records: &[SummaryRecord]) -> Vec<CountRow> {
    let mut rows: Vec<CountRow> = group_counts(records, |record| record.num_files_total)
        .into_iter()
        .map(|(value, test_cases)| CountRow { value, test_cases })
        .collect();
    rows.sort_by(|a, b| b.test_cases.cmp(&a.test_cases).then(a.value.cmp(&b.value)));
    rows
}

/// CWE occurrences over every marked line, most frequent first
///
/// Ties are broken by CWE name so the table is stable between runs.
pub fn cwe_frequencies(records: &[SummaryRecord]) -> Vec<CweFrequency> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for cwe in records.iter().flat_map(|record| record.cwes.iter()) {
        *totals.entry(cwe.as_str()).or_insert(0) += 1;
    }

    let mut rows: Vec<CweFrequency> = totals
        .into_iter()
        .map(|(cwe, total)| CweFrequency {
            cwe: cwe.to_string(),
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.cwe.cmp(&b.cwe)));
    rows
}

/// Bin values into contiguous bins of `bin_width`, empty bins included
///
/// Bins start at the multiple of `bin_width` at or below the smallest value.
pub fn histogram<I>(values: I, bin_width: usize) -> Vec<HistogramBin>
where
    I: IntoIterator<Item = usize>,
{
    let width = bin_width.max(1);
    let binned = values
        .into_iter()
        .fold(BTreeMap::new(), |mut bins: BTreeMap<usize, usize>, value| {
            *bins.entry(value / width).or_insert(0) += 1;
            bins
        });

    let (Some(&first), Some(&last)) = (binned.keys().next(), binned.keys().next_back()) else {
        return Vec::new();
    };

    (first..=last)
        .map(|index| HistogramBin {
            start: index * width,
            end: (index + 1) * width,
            count: binned.get(&index).copied().unwrap_or(0),
        })
        .collect()
}

/// Histogram of lines of code over records that carry a count
pub fn lines_of_code_histogram(records: &[SummaryRecord], bin_width: usize) -> Vec<HistogramBin> {
    histogram(records.iter().filter_map(|r| r.linesofcode), bin_width)
}

/// Histogram of marked-line counts
pub fn marked_lines_histogram(records: &[SummaryRecord], bin_width: usize) -> Vec<HistogramBin> {
    histogram(records.iter().map(|r| r.num_markedlines), bin_width)
}

/// Summarise a dataset in a handful of numbers
pub fn overview(records: &[SummaryRecord]) -> DatasetOverview {
    let distinct_cwes: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.cwes.iter().map(String::as_str))
        .collect();

    let lines_of_code = records
        .iter()
        .map(|record| record.linesofcode)
        .sum::<Option<usize>>()
        .filter(|_| !records.is_empty());

    DatasetOverview {
        test_cases: records.len(),
        marked_lines: records.iter().map(|r| r.num_markedlines).sum(),
        flaw_lines: records.iter().map(|r| r.num_flawlines).sum(),
        mixed_lines: records.iter().map(|r| r.num_mixedlines).sum(),
        flawed_files: records.iter().map(|r| r.num_files_flawed).sum(),
        distinct_cwes: distinct_cwes.len(),
        lines_of_code,
    }
}
