//! Table and dataset export
//!
//! Renders the dataset statistics from [`crate::app::manifest::analysis`] as
//! markdown tables under the outputs directory, and writes the filtered
//! records with their attrition report as JSON under the processed directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::manifest::analysis::{
    cwe_frequencies, files_flawed_table, files_total_table, lines_of_code_histogram,
    marked_lines_histogram, overview, CountRow, CweFrequency, DatasetOverview, HistogramBin,
};
use crate::app::manifest::types::{AttritionReport, Extraction};
use crate::app::models::SummaryRecord;
use crate::app::storage::StorageLayout;
use crate::constants::export;
use crate::errors::{ExportError, ExportResult, Result};

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Rows in the top-CWE table
    pub top_cwes: usize,
    /// Histogram bin width for lines of code
    pub loc_bin_width: usize,
    /// Histogram bin width for marked-line counts
    pub marked_lines_bin_width: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            top_cwes: export::DEFAULT_TOP_CWES,
            loc_bin_width: export::LOC_BIN_WIDTH,
            marked_lines_bin_width: export::MARKED_LINES_BIN_WIDTH,
        }
    }
}

/// Filtered dataset as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetExport {
    /// When the dataset was written
    pub generated_at: DateTime<Utc>,
    /// Per-stage attrition of the run that produced the records
    pub attrition: AttritionReport,
    /// Retained records
    pub records: Vec<SummaryRecord>,
}

impl DatasetExport {
    /// Snapshot an extraction, stamped with the current time
    pub fn from_extraction(extraction: &Extraction) -> Self {
        Self {
            generated_at: Utc::now(),
            attrition: extraction.attrition.clone(),
            records: extraction.records.clone(),
        }
    }
}

/// Render a two-column count table
pub fn render_count_table(title: &str, value_header: &str, rows: &[CountRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {}\n\n", title));
    out.push_str(&format!("| {} | Test cases |\n", value_header));
    out.push_str("|---:|---:|\n");
    for row in rows {
        out.push_str(&format!("| {} | {} |\n", row.value, row.test_cases));
    }
    out
}

/// Render a CWE frequency table
pub fn render_cwe_table(title: &str, rows: &[CweFrequency]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {}\n\n", title));
    out.push_str("| CWE | Total |\n");
    out.push_str("|---|---:|\n");
    for row in rows {
        out.push_str(&format!("| {} | {} |\n", escape_cell(&row.cwe), row.total));
    }
    out
}

/// Render a histogram as a table of half-open bins
pub fn render_histogram_table(title: &str, bins: &[HistogramBin]) -> String {
    let mut out = String::new();
    out.push_str(&format!("## {}\n\n", title));
    if bins.is_empty() {
        out.push_str("_No data._\n");
        return out;
    }
    out.push_str("| Bin | Test cases |\n");
    out.push_str("|---|---:|\n");
    for bin in bins {
        out.push_str(&format!("| [{}, {}) | {} |\n", bin.start, bin.end, bin.count));
    }
    out
}

/// Render the attrition report and dataset overview as one document
pub fn render_stats(
    attrition: &AttritionReport,
    summary: &DatasetOverview,
    loc_bins: &[HistogramBin],
    marked_bins: &[HistogramBin],
) -> String {
    let mut out = String::new();
    out.push_str("# SARD Dataset Statistics\n\n");

    out.push_str("## Attrition\n\n");
    out.push_str("| Stage | Remaining |\n");
    out.push_str("|---|---:|\n");
    for line in attrition.to_string().lines() {
        if let Some((stage, remaining)) = line.rsplit_once(": ") {
            out.push_str(&format!("| {} | {} |\n", escape_cell(stage), remaining));
        }
    }
    out.push('\n');

    out.push_str("## Overview\n\n");
    out.push_str("| Measure | Value |\n");
    out.push_str("|---|---:|\n");
    out.push_str(&format!("| Test cases | {} |\n", summary.test_cases));
    out.push_str(&format!("| Marked lines | {} |\n", summary.marked_lines));
    out.push_str(&format!("| Flaw lines | {} |\n", summary.flaw_lines));
    out.push_str(&format!("| Mixed lines | {} |\n", summary.mixed_lines));
    out.push_str(&format!("| Flawed files | {} |\n", summary.flawed_files));
    out.push_str(&format!("| Distinct CWEs | {} |\n", summary.distinct_cwes));
    if let Some(loc) = summary.lines_of_code {
        out.push_str(&format!("| Lines of code | {} |\n", loc));
    }
    out.push('\n');

    if summary.lines_of_code.is_some() {
        out.push_str(&render_histogram_table("Lines of code", loc_bins));
        out.push('\n');
    }
    out.push_str(&render_histogram_table("Marked lines", marked_bins));
    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Writes tables and the processed dataset into a storage layout
#[derive(Debug, Clone)]
pub struct TableExporter {
    layout: StorageLayout,
    settings: ExportSettings,
}

impl TableExporter {
    /// Create an exporter writing under `layout`
    pub fn new(layout: StorageLayout, settings: ExportSettings) -> Self {
        Self { layout, settings }
    }

    /// Write every table to the outputs directory
    ///
    /// Returns the paths written, in a stable order.
    pub async fn write_tables(&self, extraction: &Extraction) -> Result<Vec<PathBuf>> {
        let outputs = self.layout.outputs_dir()?;
        let records = &extraction.records;

        let cwes = cwe_frequencies(records);
        let top: Vec<CweFrequency> = cwes.iter().take(self.settings.top_cwes).cloned().collect();

        let tables = [
            (
                export::FILES_FLAWED_TABLE,
                render_count_table(
                    "Test cases by number of flawed files",
                    "Flawed files",
                    &files_flawed_table(records),
                ),
            ),
            (
                export::FILES_TOTAL_TABLE,
                render_count_table(
                    "Test cases by total number of files",
                    "Files",
                    &files_total_table(records),
                ),
            ),
            (
                export::CWE_TOP_TABLE,
                render_cwe_table(&format!("Top {} CWEs", self.settings.top_cwes), &top),
            ),
            (export::CWE_ALL_TABLE, render_cwe_table("All CWEs", &cwes)),
            (
                export::STATS_TABLE,
                render_stats(
                    &extraction.attrition,
                    &overview(records),
                    &lines_of_code_histogram(records, self.settings.loc_bin_width),
                    &marked_lines_histogram(records, self.settings.marked_lines_bin_width),
                ),
            ),
        ];

        let mut written = Vec::with_capacity(tables.len());
        for (file_name, content) in tables {
            let path = outputs.join(file_name);
            write_file(&path, content.as_bytes()).await?;
            written.push(path);
        }

        info!("Wrote {} tables to {}", written.len(), outputs.display());
        Ok(written)
    }

    /// Write the filtered dataset to the processed directory
    pub async fn write_dataset(&self, extraction: &Extraction) -> Result<PathBuf> {
        let path = self.layout.processed_dir()?.join(export::DATASET_FILE_NAME);
        write_dataset(&path, extraction).await?;
        Ok(path)
    }
}

/// Serialize an extraction to a JSON file
pub async fn write_dataset(path: &Path, extraction: &Extraction) -> ExportResult<()> {
    let dataset = DatasetExport::from_extraction(extraction);
    let json = serde_json::to_vec_pretty(&dataset)?;
    write_file(path, &json).await?;
    info!(
        "Wrote {} records to {}",
        dataset.records.len(),
        path.display()
    );
    Ok(())
}

async fn write_file(path: &Path, content: &[u8]) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ExportError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ExportError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::manifest::utils::extract_from_xml;
    use crate::app::manifest::types::ExtractOptions;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"<container>
  <testcase id="1" status="Accepted" language="C">
    <file path="a/1.c"><flaw line="3" name="CWE-121"/><flaw line="9" name="CWE-121"/></file>
  </testcase>
  <testcase id="2" status="Accepted" language="C">
    <file path="a/2.c"><mixed line="4" name="CWE-78: OS Command | Injection"/></file>
    <file path="a/3.c"><flaw line="7" name="CWE-121"/></file>
  </testcase>
</container>"#;

    #[test]
    fn test_render_count_table() {
        let rows = vec![
            CountRow { value: 1, test_cases: 5 },
            CountRow { value: 2, test_cases: 3 },
        ];
        let table = render_count_table("Files", "Flawed files", &rows);
        assert!(table.starts_with("## Files\n\n| Flawed files | Test cases |\n"));
        assert!(table.contains("| 1 | 5 |\n"));
        assert!(table.ends_with("| 2 | 3 |\n"));
    }

    #[test]
    fn test_render_cwe_table_escapes_pipes() {
        let rows = vec![CweFrequency {
            cwe: "CWE-78: A | B".to_string(),
            total: 2,
        }];
        let table = render_cwe_table("All CWEs", &rows);
        assert!(table.contains("| CWE-78: A \\| B | 2 |"));
    }

    #[test]
    fn test_render_empty_histogram() {
        let table = render_histogram_table("Lines of code", &[]);
        assert!(table.contains("_No data._"));
    }

    #[test]
    fn test_render_stats_includes_attrition() {
        let extraction = extract_from_xml(MANIFEST, ExtractOptions::default()).unwrap();
        let records = &extraction.records;
        let stats = render_stats(
            &extraction.attrition,
            &overview(records),
            &lines_of_code_histogram(records, 50),
            &marked_lines_histogram(records, 1),
        );

        assert!(stats.contains("| SARD Total | 2 |"));
        assert!(stats.contains("| Removed tests with >=15 marked lines | 2 |"));
        assert!(stats.contains("| Distinct CWEs | 2 |"));
        assert!(stats.contains("## Marked lines"));
        assert!(!stats.contains("## Lines of code"));
    }

    /// Test writing every output into a storage layout.
    ///
    /// Purpose: Verifies that all tables land in the outputs directory and
    /// the dataset JSON in the processed directory, and that the JSON reads
    /// back into the same records.
    /// Benefit: Downstream notebooks can rely on file names and contents.
    #[tokio::test]
    async fn test_exporter_writes_all_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        let exporter = TableExporter::new(layout.clone(), ExportSettings::default());
        let extraction = extract_from_xml(MANIFEST, ExtractOptions::default()).unwrap();

        let tables = exporter.write_tables(&extraction).await.unwrap();
        assert_eq!(tables.len(), 5);
        for path in &tables {
            assert!(path.starts_with(temp_dir.path().join("outputs")));
            assert!(path.is_file());
        }

        let top = std::fs::read_to_string(temp_dir.path().join("outputs/cwe_top.md")).unwrap();
        let first_row = top.lines().find(|l| l.starts_with("| CWE-")).unwrap();
        assert_eq!(first_row, "| CWE-121 | 3 |");

        let dataset_path = exporter.write_dataset(&extraction).await.unwrap();
        assert_eq!(
            dataset_path,
            temp_dir.path().join("processed/sard_filtered.json")
        );
        let json = std::fs::read_to_string(&dataset_path).unwrap();
        let parsed: DatasetExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.records, extraction.records);
        assert_eq!(parsed.attrition, extraction.attrition);
    }
}
