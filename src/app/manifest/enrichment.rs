//! Lines-of-code enrichment
//!
//! Counts the non-blank lines of every distinct flawed file and stores the
//! per-test-case sum in [`SummaryRecord::linesofcode`]. Reads are
//! deduplicated across the whole run and performed with bounded concurrency;
//! the result does not depend on completion order.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::app::models::SummaryRecord;

/// Outcome of an enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Distinct source files looked up
    pub files_counted: usize,
    /// Files that could not be read and counted as zero lines
    pub unreadable: usize,
}

/// Counts non-blank source lines under a test-case root
#[derive(Debug, Clone)]
pub struct LinesOfCodeCounter {
    root: PathBuf,
    concurrency: usize,
}

impl LinesOfCodeCounter {
    /// Create a counter resolving paths against `root`
    pub fn new(root: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            root: root.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Directory that relative paths resolve against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Count the non-blank lines of one file
    ///
    /// Returns `None` if the file cannot be read; undecodable bytes never make
    /// a file unreadable.
    pub async fn count_file(&self, relative_path: &str) -> Option<usize> {
        let path = self.root.join(relative_path);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(count_nonblank_lines(&bytes)),
            Err(e) => {
                debug!("Unreadable source file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Set `linesofcode` on every record
    pub async fn enrich(&self, records: &mut [SummaryRecord]) -> EnrichmentStats {
        let unique_paths: BTreeSet<String> = records
            .iter()
            .flat_map(|record| record.filepaths.iter().cloned())
            .collect();

        info!(
            "Counting lines of code for {} source files under {}",
            unique_paths.len(),
            self.root.display()
        );

        let counter = self;
        let counts: HashMap<String, Option<usize>> = stream::iter(unique_paths)
            .map(|path| async move {
                let count = counter.count_file(&path).await;
                (path, count)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for record in records.iter_mut() {
            let total: usize = record
                .filepaths
                .iter()
                .filter_map(|path| counts.get(path).copied().flatten())
                .sum();
            record.linesofcode = Some(total);
        }

        let stats = EnrichmentStats {
            files_counted: counts.len(),
            unreadable: counts.values().filter(|count| count.is_none()).count(),
        };
        if stats.unreadable > 0 {
            debug!(
                "{} of {} source files were unreadable",
                stats.unreadable, stats.files_counted
            );
        }
        stats
    }
}

/// Count lines containing at least one non-whitespace character
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. Bytes that are not valid UTF-8
/// are skipped.
pub fn count_nonblank_lines(bytes: &[u8]) -> usize {
    String::from_utf8_lossy(bytes)
        .split(['\n', '\r'])
        .filter(|line| {
            line.chars()
                .any(|c| !c.is_whitespace() && c != char::REPLACEMENT_CHARACTER)
        })
        .count()
}
