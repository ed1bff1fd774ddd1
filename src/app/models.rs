//! Data models for SARD manifest processing
//!
//! This module defines the raw manifest records (test cases, files, line
//! annotations), the merged marked-line record, and the per-test-case summary
//! produced by the extractor.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::manifest::{
    ATTR_LINE, ATTR_NAME, ATTR_PATH, DEPRECATED_STATUS, HEADER_SUFFIX, LINE_SENTINEL,
};

/// Attribute mapping of a manifest node, ordered by key
pub type Attributes = BTreeMap<String, String>;

/// Role of an annotated line within a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    /// The vulnerability itself
    Flaw,
    /// Context partially relevant to the vulnerability
    Mixed,
    /// A patched line; marks the test case as non-vulnerable
    Fix,
}

impl LineTag {
    /// Element name used for this tag in the manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTag::Flaw => "flaw",
            LineTag::Mixed => "mixed",
            LineTag::Fix => "fix",
        }
    }
}

impl fmt::Display for LineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flaw" => Ok(LineTag::Flaw),
            "mixed" => Ok(LineTag::Mixed),
            "fix" => Ok(LineTag::Fix),
            other => Err(other.to_string()),
        }
    }
}

/// A line annotation child of a file node
///
/// The element name is kept as written; it is only interpreted as a
/// [`LineTag`] for test cases that reach line extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAnnotation {
    /// Element name of the annotation
    pub element: String,
    /// All attributes of the annotation element
    pub attributes: Attributes,
}

impl LineAnnotation {
    /// Create an annotation from its element name and attributes
    pub fn new(element: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            element: element.into(),
            attributes,
        }
    }

    /// Interpret the element name, returning it unchanged when unknown
    pub fn tag(&self) -> Result<LineTag, String> {
        self.element.parse()
    }
}

/// A file node of a test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    /// All attributes of the file element
    pub attributes: Attributes,
    /// Line annotations in document order
    pub lines: Vec<LineAnnotation>,
}

impl FileEntry {
    /// Create a file entry without annotations
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            lines: Vec::new(),
        }
    }

    /// The relative path of the file, if declared
    pub fn path(&self) -> Option<&str> {
        self.attributes.get(ATTR_PATH).map(String::as_str)
    }
}

/// One test case of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Opaque identifier, unique within the manifest
    pub id: String,
    /// Review status (`Accepted`, `Candidate`, `Deprecated`, ...)
    pub status: String,
    /// Source language label
    pub language: String,
    /// Raw `numberOfFiles` attribute, when present
    pub number_of_files: Option<String>,
    /// File children in document order
    pub files: Vec<FileEntry>,
}

impl ManifestEntry {
    /// Whether the test case has been withdrawn from the corpus
    pub fn is_deprecated(&self) -> bool {
        self.status == DEPRECATED_STATUS
    }
}

/// A line annotation merged with the attributes of its file
///
/// Line attributes take precedence over file attributes on key collision;
/// `linetag` always comes from the annotation element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedLine {
    /// Relative path of the annotated file
    pub path: String,
    /// 1-based line number as written in the manifest
    pub line: String,
    /// CWE name of the annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Annotation kind
    pub linetag: LineTag,
    /// Every other merged attribute
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Attributes,
}

impl MarkedLine {
    /// Merge file and line attributes into one record
    ///
    /// Fails with the name of the attribute when neither level provides a
    /// `path` or a `line`.
    pub fn merge(
        file: &FileEntry,
        annotation: &LineAnnotation,
        linetag: LineTag,
    ) -> Result<Self, &'static str> {
        let mut merged = file.attributes.clone();
        merged.extend(
            annotation
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        let path = merged.remove(ATTR_PATH).ok_or(ATTR_PATH)?;
        let line = merged.remove(ATTR_LINE).ok_or(ATTR_LINE)?;
        let name = merged.remove(ATTR_NAME);

        Ok(Self {
            path,
            line,
            name,
            linetag,
            extra: merged,
        })
    }

    /// Whether the record points at "no specific line"
    pub fn is_sentinel(&self) -> bool {
        self.line == LINE_SENTINEL
    }

    /// Whether the record belongs to a header file
    pub fn is_header(&self) -> bool {
        self.path.ends_with(HEADER_SUFFIX)
    }
}

/// Per-test-case statistics for a retained test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub testid: String,
    pub lang: String,
    pub status: String,
    /// Retained marked lines in document order
    pub markedlines: Vec<MarkedLine>,
    pub num_markedlines: usize,
    pub num_flawlines: usize,
    pub num_mixedlines: usize,
    pub num_fixlines: usize,
    /// Declared or actual file count, depending on configuration
    pub num_files_total: usize,
    /// Distinct paths among the marked lines
    pub num_files_flawed: usize,
    /// CWE names of the marked lines, in order, duplicates retained
    pub cwes: Vec<String>,
    /// Distinct flawed paths in first-appearance order
    pub filepaths: Vec<String>,
    /// Non-blank lines across the flawed files, when enrichment ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linesofcode: Option<usize>,
}

impl SummaryRecord {
    /// Number of marked lines carrying the given tag
    pub fn count_tag(&self, tag: LineTag) -> usize {
        self.markedlines
            .iter()
            .filter(|line| line.linetag == tag)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_line_tag_parsing() {
        assert_eq!("flaw".parse::<LineTag>(), Ok(LineTag::Flaw));
        assert_eq!("mixed".parse::<LineTag>(), Ok(LineTag::Mixed));
        assert_eq!("fix".parse::<LineTag>(), Ok(LineTag::Fix));
        assert_eq!("Flaw".parse::<LineTag>(), Err("Flaw".to_string()));
        assert_eq!(LineTag::Mixed.to_string(), "mixed");
    }

    #[test]
    fn test_deprecated_is_exact_match() {
        let mut entry = ManifestEntry {
            id: "1".to_string(),
            status: "Deprecated".to_string(),
            language: "C".to_string(),
            number_of_files: None,
            files: Vec::new(),
        };
        assert!(entry.is_deprecated());

        entry.status = "deprecated".to_string();
        assert!(!entry.is_deprecated());
    }

    /// Test attribute merging precedence.
    ///
    /// Purpose: Verifies that line attributes override file attributes and that
    /// the remaining keys land in `extra`.
    /// Benefit: Keeps the merged schema stable regardless of which level
    /// declares an attribute.
    #[test]
    fn test_merge_line_overrides_file() {
        let file = FileEntry::new(attrs(&[
            ("path", "src/a.c"),
            ("language", "C"),
            ("name", "file-level"),
        ]));
        let annotation = LineAnnotation::new("flaw", attrs(&[("line", "10"), ("name", "CWE-120")]));

        let merged = MarkedLine::merge(&file, &annotation, LineTag::Flaw).unwrap();
        assert_eq!(merged.path, "src/a.c");
        assert_eq!(merged.line, "10");
        assert_eq!(merged.name.as_deref(), Some("CWE-120"));
        assert_eq!(merged.linetag, LineTag::Flaw);
        assert_eq!(merged.extra, attrs(&[("language", "C")]));
    }

    #[test]
    fn test_merge_requires_path_and_line() {
        let annotation = LineAnnotation::new("flaw", attrs(&[("line", "3")]));
        assert_eq!(
            MarkedLine::merge(&FileEntry::default(), &annotation, LineTag::Flaw),
            Err("path")
        );

        let file = FileEntry::new(attrs(&[("path", "a.c")]));
        let annotation = LineAnnotation::new("flaw", attrs(&[("name", "CWE-1")]));
        assert_eq!(
            MarkedLine::merge(&file, &annotation, LineTag::Flaw),
            Err("line")
        );
    }

    #[test]
    fn test_sentinel_and_header_detection() {
        let file = FileEntry::new(attrs(&[("path", "include/util.h")]));
        let annotation = LineAnnotation::new("mixed", attrs(&[("line", "0")]));
        assert_eq!(annotation.tag(), Ok(LineTag::Mixed));

        let merged = MarkedLine::merge(&file, &annotation, LineTag::Mixed).unwrap();
        assert!(merged.is_sentinel());
        assert!(merged.is_header());

        let unknown = LineAnnotation::new("note", Attributes::new());
        assert_eq!(unknown.tag(), Err("note".to_string()));
    }

    #[test]
    fn test_summary_record_serializes_without_missing_loc() {
        let record = SummaryRecord {
            testid: "7".to_string(),
            lang: "C".to_string(),
            status: "Accepted".to_string(),
            markedlines: Vec::new(),
            num_markedlines: 0,
            num_flawlines: 0,
            num_mixedlines: 0,
            num_fixlines: 0,
            num_files_total: 1,
            num_files_flawed: 0,
            cwes: Vec::new(),
            filepaths: Vec::new(),
            linesofcode: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("linesofcode").is_none());
        assert_eq!(json["testid"], "7");
    }
}
