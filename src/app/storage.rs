//! Storage directory layout
//!
//! All inputs and outputs live under a single storage root, split into four
//! categories:
//!
//! ```text
//! storage/
//! ├── external/            manifest and test-case sources
//! │   ├── full_manifest.xml
//! │   └── testcases/
//! ├── interim/
//! ├── processed/           filtered dataset (JSON)
//! └── outputs/             tables
//! ```
//!
//! The layout is resolved once at startup and passed by value to whoever
//! needs a directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::constants::storage;
use crate::errors::{StorageError, StorageResult};

/// Category of a storage directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageCategory {
    External,
    Interim,
    Processed,
    Outputs,
}

impl StorageCategory {
    /// Every category, in layout order
    pub const ALL: [StorageCategory; 4] = [
        StorageCategory::External,
        StorageCategory::Interim,
        StorageCategory::Processed,
        StorageCategory::Outputs,
    ];

    /// Directory name under the storage root
    pub fn dir_name(&self) -> &'static str {
        match self {
            StorageCategory::External => storage::EXTERNAL_DIR,
            StorageCategory::Interim => storage::INTERIM_DIR,
            StorageCategory::Processed => storage::PROCESSED_DIR,
            StorageCategory::Outputs => storage::OUTPUTS_DIR,
        }
    }
}

impl fmt::Display for StorageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for StorageCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageCategory::ALL
            .into_iter()
            .find(|category| category.dir_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown storage category '{}', expected external, interim, processed or outputs",
                    s
                )
            })
    }
}

/// Resolved storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new(storage::DEFAULT_ROOT)
    }
}

impl StorageLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a category directory, without touching the filesystem
    pub fn path(&self, category: StorageCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Path of a category directory, created if absent
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotADirectory` if the path exists as a file, and
    /// `StorageError::CreateFailed` if it cannot be created.
    pub fn dir(&self, category: StorageCategory) -> StorageResult<PathBuf> {
        let path = self.path(category);
        if path.exists() && !path.is_dir() {
            return Err(StorageError::NotADirectory { path });
        }

        std::fs::create_dir_all(&path).map_err(|source| StorageError::CreateFailed {
            path: path.clone(),
            source,
        })?;
        debug!("Using {} directory: {}", category, path.display());
        Ok(path)
    }

    pub fn external_dir(&self) -> StorageResult<PathBuf> {
        self.dir(StorageCategory::External)
    }

    pub fn interim_dir(&self) -> StorageResult<PathBuf> {
        self.dir(StorageCategory::Interim)
    }

    pub fn processed_dir(&self) -> StorageResult<PathBuf> {
        self.dir(StorageCategory::Processed)
    }

    pub fn outputs_dir(&self) -> StorageResult<PathBuf> {
        self.dir(StorageCategory::Outputs)
    }

    /// Default manifest location
    pub fn manifest_path(&self) -> PathBuf {
        self.path(StorageCategory::External)
            .join(storage::MANIFEST_FILE_NAME)
    }

    /// Default directory that manifest source paths resolve against
    pub fn testcases_path(&self) -> PathBuf {
        self.path(StorageCategory::External)
            .join(storage::TESTCASES_DIR)
    }

    /// Create every category directory
    pub fn ensure_all(&self) -> StorageResult<Vec<(StorageCategory, PathBuf)>> {
        StorageCategory::ALL
            .into_iter()
            .map(|category| Ok((category, self.dir(category)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "processed".parse::<StorageCategory>(),
            Ok(StorageCategory::Processed)
        );
        assert_eq!(
            "Outputs".parse::<StorageCategory>(),
            Ok(StorageCategory::Outputs)
        );
        assert!("raw".parse::<StorageCategory>().is_err());
        assert_eq!(StorageCategory::Interim.to_string(), "interim");
    }

    #[test]
    fn test_default_paths() {
        let layout = StorageLayout::new("/data/sard");
        assert_eq!(
            layout.manifest_path(),
            PathBuf::from("/data/sard/external/full_manifest.xml")
        );
        assert_eq!(
            layout.testcases_path(),
            PathBuf::from("/data/sard/external/testcases")
        );
        assert_eq!(StorageLayout::default().root(), Path::new("storage"));
    }

    /// Test directory creation on demand.
    ///
    /// Purpose: Verifies that requesting a category creates it under the
    /// root, including missing parents, and is idempotent.
    /// Benefit: A fresh checkout works without manual setup.
    #[test]
    fn test_dir_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path().join("nested/storage"));

        let outputs = layout.outputs_dir().unwrap();
        assert!(outputs.is_dir());
        assert_eq!(outputs, temp_dir.path().join("nested/storage/outputs"));
        assert_eq!(layout.outputs_dir().unwrap(), outputs);

        let all = layout.ensure_all().unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|(_, path)| path.is_dir()));
    }

    #[test]
    fn test_dir_rejects_file_in_the_way() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("interim"), "not a directory").unwrap();
        let layout = StorageLayout::new(temp_dir.path());

        let err = layout.interim_dir().unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory { .. }));
    }
}
