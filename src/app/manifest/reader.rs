//! Streaming manifest reader
//!
//! The SARD manifest is a single large XML document:
//!
//! ```xml
//! <container>
//!   <testcase id="42" status="Accepted" language="C" numberOfFiles="2">
//!     <description>...</description>
//!     <file path="000/042/a.c" language="C">
//!       <flaw line="10" name="CWE-120: Buffer Copy without Checking Size of Input"/>
//!     </file>
//!   </testcase>
//! </container>
//! ```
//!
//! [`ManifestReader`] walks the document with a pull parser and yields one
//! [`ManifestEntry`] per test case, so only a single test case is held in
//! memory at a time.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info};

use crate::app::models::{Attributes, FileEntry, LineAnnotation, ManifestEntry};
use crate::constants::manifest::{
    ATTR_ID, ATTR_LANGUAGE, ATTR_NUMBER_OF_FILES, ATTR_STATUS, FILE_ELEMENT, TESTCASE_ELEMENT,
};
use crate::errors::{ManifestError, ManifestResult};

/// Depth of test-case elements (the root element sits at depth 0)
const TESTCASE_DEPTH: usize = 1;
/// Depth of file elements
const FILE_DEPTH: usize = 2;
/// Depth of line-annotation elements
const ANNOTATION_DEPTH: usize = 3;

/// Pull-based reader yielding one test case at a time
pub struct ManifestReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: TreeState,
    finished: bool,
}

impl ManifestReader<BufReader<File>> {
    /// Open a manifest file
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the file does not exist.
    pub fn open<P: AsRef<Path>>(manifest_path: P) -> ManifestResult<Self> {
        let path = manifest_path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ManifestError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ManifestError::Io(e),
        })?;

        info!("Reading manifest from: {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> ManifestReader<&'a [u8]> {
    /// Read a manifest held in memory
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> ManifestReader<R> {
    /// Wrap any buffered source of manifest XML
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            state: TreeState::default(),
            finished: false,
        }
    }

    /// Number of test-case nodes encountered so far
    pub fn entries_read(&self) -> usize {
        self.state.position
    }

    /// Read the next test case
    ///
    /// Returns `Ok(None)` once the document is exhausted. After an error the
    /// reader is finished and yields nothing further.
    pub fn next_entry(&mut self) -> ManifestResult<Option<ManifestEntry>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.advance();
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    fn advance(&mut self) -> ManifestResult<Option<ManifestEntry>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => self.state.open(&start)?,
                Event::Empty(start) => {
                    self.state.open(&start)?;
                    if let Some(entry) = self.state.close() {
                        return Ok(Some(entry));
                    }
                }
                Event::End(_) => {
                    if let Some(entry) = self.state.close() {
                        return Ok(Some(entry));
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    if self.state.depth != 0 {
                        return Err(ManifestError::Truncated);
                    }
                    debug!("Manifest exhausted after {} test cases", self.state.position);
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ManifestReader<R> {
    type Item = ManifestResult<ManifestEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Position of the reader inside the manifest tree
#[derive(Debug, Default)]
struct TreeState {
    depth: usize,
    in_file: bool,
    position: usize,
    current: Option<ManifestEntry>,
}

impl TreeState {
    fn open(&mut self, start: &BytesStart<'_>) -> ManifestResult<()> {
        match self.depth {
            TESTCASE_DEPTH => {
                self.position += 1;
                self.current = Some(parse_test_case(start, self.position)?);
            }
            FILE_DEPTH => {
                if start.name().as_ref() == FILE_ELEMENT.as_bytes() {
                    if let Some(entry) = self.current.as_mut() {
                        entry.files.push(FileEntry::new(parse_attributes(start)?));
                        self.in_file = true;
                    }
                }
            }
            ANNOTATION_DEPTH if self.in_file => {
                if let Some(file) = self
                    .current
                    .as_mut()
                    .and_then(|entry| entry.files.last_mut())
                {
                    let annotation =
                        LineAnnotation::new(element_name(start), parse_attributes(start)?);
                    file.lines.push(annotation);
                }
            }
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost element, returning a completed test case
    fn close(&mut self) -> Option<ManifestEntry> {
        self.depth = self.depth.saturating_sub(1);
        match self.depth {
            TESTCASE_DEPTH => self.current.take(),
            FILE_DEPTH => {
                self.in_file = false;
                None
            }
            _ => None,
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn parse_attributes(start: &BytesStart<'_>) -> ManifestResult<Attributes> {
    let mut attributes = Attributes::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

fn parse_test_case(start: &BytesStart<'_>, position: usize) -> ManifestResult<ManifestEntry> {
    let mut attributes = parse_attributes(start)?;

    let id = attributes
        .remove(ATTR_ID)
        .ok_or_else(|| ManifestError::MissingTestCaseAttribute {
            position,
            attribute: ATTR_ID.to_string(),
        })?;

    let mut required = |attribute: &str| {
        attributes
            .remove(attribute)
            .ok_or_else(|| ManifestError::MissingAttribute {
                element: TESTCASE_ELEMENT.to_string(),
                attribute: attribute.to_string(),
                testcase: id.clone(),
            })
    };
    let status = required(ATTR_STATUS)?;
    let language = required(ATTR_LANGUAGE)?;

    let number_of_files = attributes.remove(ATTR_NUMBER_OF_FILES);

    Ok(ManifestEntry {
        id,
        status,
        language,
        number_of_files,
        files: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container>
  <testcase id="42" status="Accepted" language="C" numberOfFiles="2" type="Source Code">
    <description><![CDATA[Buffer overflow <with> markup]]></description>
    <association type="hasPair" testcaseid="43"/>
    <file path="000/042/a.c" language="C" size="120">
      <flaw line="10" name="CWE-120: Buffer Copy"/>
      <mixed line="12" name="CWE-120: Buffer Copy"></mixed>
    </file>
    <file path="000/042/b.h" language="C"/>
  </testcase>
  <testcase id="43" status="Deprecated" language="Java"/>
</container>"#;

    /// Test streaming of a realistic manifest fragment.
    ///
    /// Purpose: Verifies that test-case attributes, file children, annotation
    /// order and empty elements are all captured, and that non-file children
    /// (description, association) are skipped.
    /// Benefit: Ensures the reader mirrors the manifest tree exactly.
    #[test]
    fn test_reads_sample_manifest() {
        let mut reader = ManifestReader::from_xml(SAMPLE);

        let first = reader.next_entry().unwrap().unwrap();
        assert_eq!(first.id, "42");
        assert_eq!(first.status, "Accepted");
        assert_eq!(first.language, "C");
        assert_eq!(first.number_of_files.as_deref(), Some("2"));
        assert_eq!(first.files.len(), 2);
        assert_eq!(first.files[0].path(), Some("000/042/a.c"));
        assert_eq!(first.files[0].attributes.get("size").unwrap(), "120");
        assert_eq!(first.files[0].lines.len(), 2);
        assert_eq!(first.files[0].lines[0].element, "flaw");
        assert_eq!(first.files[0].lines[0].attributes.get("line").unwrap(), "10");
        assert_eq!(first.files[0].lines[1].element, "mixed");
        assert_eq!(first.files[1].path(), Some("000/042/b.h"));
        assert!(first.files[1].lines.is_empty());

        let second = reader.next_entry().unwrap().unwrap();
        assert_eq!(second.id, "43");
        assert!(second.is_deprecated());
        assert!(second.files.is_empty());
        assert_eq!(second.number_of_files, None);

        assert!(reader.next_entry().unwrap().is_none());
        assert!(reader.next_entry().unwrap().is_none());
        assert_eq!(reader.entries_read(), 2);
    }

    #[test]
    fn test_iterator_collects_all_entries() {
        let entries: ManifestResult<Vec<ManifestEntry>> =
            ManifestReader::from_xml(SAMPLE).collect();
        let ids: Vec<String> = entries.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["42", "43"]);
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let xml = r#"<c><testcase id="1" status="Accepted" language="C++">
            <file path="a&amp;b.cpp"><flaw line="3" name="CWE-78: &quot;OS&quot;"/></file>
        </testcase></c>"#;

        let entry = ManifestReader::from_xml(xml).next_entry().unwrap().unwrap();
        assert_eq!(entry.files[0].path(), Some("a&b.cpp"));
        assert_eq!(
            entry.files[0].lines[0].attributes.get("name").unwrap(),
            "CWE-78: \"OS\""
        );
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let xml = r#"<c><testcase id="9" language="C"/></c>"#;
        let error = ManifestReader::from_xml(xml).next_entry().unwrap_err();

        match error {
            ManifestError::MissingAttribute {
                attribute,
                testcase,
                ..
            } => {
                assert_eq!(attribute, "status");
                assert_eq!(testcase, "9");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_id_reports_position() {
        let xml = r#"<c><testcase id="1" status="Accepted" language="C"/><testcase status="Accepted" language="C"/></c>"#;
        let results: Vec<_> = ManifestReader::from_xml(xml).collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ManifestError::MissingTestCaseAttribute { position: 2, .. })
        ));
    }

    /// Test that annotation contents are not interpreted while reading.
    ///
    /// Purpose: Unknown annotation elements and non-numeric `numberOfFiles`
    /// values are carried through as written.
    /// Benefit: Only test cases that reach line extraction or declared file
    /// counting can fail on them.
    #[test]
    fn test_annotations_and_file_count_kept_raw() {
        let xml = r#"<c><testcase id="5" status="Deprecated" language="Java" numberOfFiles="">
            <file path="a.c"><note line="1"/></file>
        </testcase></c>"#;

        let entry = ManifestReader::from_xml(xml).next_entry().unwrap().unwrap();
        assert_eq!(entry.number_of_files.as_deref(), Some(""));
        assert_eq!(entry.files[0].lines[0].element, "note");
        assert!(entry.files[0].lines[0].tag().is_err());
    }

    #[test]
    fn test_truncated_document() {
        let xml = r#"<c><testcase id="5" status="Accepted" language="C"><file path="a.c">"#;
        let mut reader = ManifestReader::from_xml(xml);

        assert!(reader.next_entry().is_err());
        // A failed reader stays finished
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let xml = r#"<c><testcase id="5" status="Accepted" language="C"></file></c>"#;
        let error = ManifestReader::from_xml(xml).next_entry().unwrap_err();
        assert!(matches!(error, ManifestError::Xml(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("full_manifest.xml");

        match ManifestReader::open(&path) {
            Err(ManifestError::NotFound { path: reported }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected NotFound"),
        }
    }
}
