//! Convenience functions running the whole extraction pipeline
//!
//! [`extract_manifest`] is the entry point used by the command line: it
//! streams the manifest on a blocking worker thread, enriches the retained
//! records with lines of code, then applies the thresholds.

use std::io;
use std::path::Path;

use tracing::{info, warn};

use super::analysis::apply_thresholds;
use super::enrichment::LinesOfCodeCounter;
use super::extractor::ManifestExtractor;
use super::reader::ManifestReader;
use super::types::{ExtractOptions, Extraction};
use crate::errors::{ManifestError, ManifestResult};

/// Extract summary records from a manifest file
///
/// # Arguments
///
/// * `manifest_path` - Path to the manifest XML
/// * `options` - Filter chain, enrichment and threshold settings
///
/// # Errors
///
/// Returns `ManifestError::NotFound` before any processing if the manifest
/// does not exist, and the first malformed-manifest error otherwise.
///
/// # Example
///
/// ```rust,no_run
/// use sard_explorer::app::manifest::{extract_manifest, ExtractOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ExtractOptions::default().with_testcases_root("storage/external/testcases");
/// let extraction = extract_manifest("storage/external/full_manifest.xml", options).await?;
/// println!("{}", extraction.attrition);
/// # Ok(())
/// # }
/// ```
pub async fn extract_manifest<P: AsRef<Path>>(
    manifest_path: P,
    options: ExtractOptions,
) -> ManifestResult<Extraction> {
    let path = manifest_path.as_ref().to_path_buf();
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ManifestError::NotFound { path });
    }

    let chain_options = options.clone();
    let mut extraction = tokio::task::spawn_blocking(move || -> ManifestResult<Extraction> {
        let reader = ManifestReader::open(&path)?;
        ManifestExtractor::new(chain_options).extract(reader)
    })
    .await
    .map_err(|e| ManifestError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

    let enriched = match (&options.testcases_root, options.compute_lines_of_code) {
        (Some(root), true) => {
            let counter = LinesOfCodeCounter::new(root, options.loc_concurrency);
            let stats = counter.enrich(&mut extraction.records).await;
            extraction.attrition.unreadable_source_files = stats.unreadable;
            true
        }
        (None, true) => {
            warn!("No test-case root configured; skipping lines-of-code enrichment");
            false
        }
        (_, false) => false,
    };

    let records = std::mem::take(&mut extraction.records);
    extraction.records = apply_thresholds(records, &options, enriched, &mut extraction.attrition);

    info!(
        "Extraction complete: {} of {} test cases retained",
        extraction.len(),
        extraction.attrition.total
    );
    Ok(extraction)
}

/// Extract summary records from manifest XML held in memory
///
/// Lines of code are never computed here, so only the marked-lines threshold
/// can apply.
pub fn extract_from_xml(xml: &str, options: ExtractOptions) -> ManifestResult<Extraction> {
    let mut extraction =
        ManifestExtractor::new(options.clone()).extract(ManifestReader::from_xml(xml))?;

    let records = std::mem::take(&mut extraction.records);
    extraction.records = apply_thresholds(records, &options, false, &mut extraction.attrition);
    Ok(extraction)
}

/// Count the test cases of a manifest without filtering them
///
/// Every test case is still fully parsed, so this doubles as a validation
/// pass over the document.
pub async fn count_test_cases<P: AsRef<Path>>(manifest_path: P) -> ManifestResult<usize> {
    let path = manifest_path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || -> ManifestResult<usize> {
        let mut reader = ManifestReader::open(&path)?;
        while reader.next_entry()?.is_some() {}
        Ok(reader.entries_read())
    })
    .await
    .map_err(|e| ManifestError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}
