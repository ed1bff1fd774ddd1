//! Configuration management for SARD Explorer
//!
//! This module provides TOML configuration with zero-config defaults,
//! multi-source loading and first-run initialization.
//!
//! Precedence, lowest first: built-in defaults, the configuration file,
//! environment variables (`SARD_STORAGE_ROOT`), command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use crate::app::export::ExportSettings;
use crate::app::manifest::types::{ExtractOptions, FileCountMode};
use crate::app::storage::StorageLayout;
use crate::constants::{config as paths, env, export, extract, logging, storage};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Storage locations
    pub storage: StorageConfigToml,
    /// Filter chain, enrichment and thresholds
    pub extract: ExtractConfigToml,
    /// Table export settings
    pub export: ExportConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfigToml {
    /// Storage root directory
    pub root: PathBuf,
    /// Manifest path (None = `<root>/external/full_manifest.xml`)
    pub manifest: Option<PathBuf>,
    /// Test-case source directory (None = `<root>/external/testcases`)
    pub testcases: Option<PathBuf>,
}

impl Default for StorageConfigToml {
    fn default() -> Self {
        Self {
            root: PathBuf::from(storage::DEFAULT_ROOT),
            manifest: None,
            testcases: None,
        }
    }
}

/// TOML-friendly extraction configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfigToml {
    /// Languages retained by the language filter
    pub languages: Vec<String>,
    /// Drop marked lines in header files
    pub exclude_header_files: bool,
    /// Lines-of-code threshold (0 = disabled)
    pub max_lines_of_code: usize,
    /// Marked-lines threshold (0 = disabled)
    pub max_marked_lines: usize,
    /// Count lines of code of the flawed files
    pub compute_lines_of_code: bool,
    /// Source of the total file count: "actual" or "declared"
    pub file_count_mode: FileCountMode,
    /// Concurrent source-file reads
    pub loc_concurrency: usize,
    /// Test cases between debug progress logs
    pub progress_batch_size: usize,
}

impl Default for ExtractConfigToml {
    fn default() -> Self {
        Self {
            languages: extract::DEFAULT_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            exclude_header_files: true,
            max_lines_of_code: extract::DEFAULT_MAX_LINES_OF_CODE,
            max_marked_lines: extract::DEFAULT_MAX_MARKED_LINES,
            compute_lines_of_code: true,
            file_count_mode: FileCountMode::Actual,
            loc_concurrency: extract::DEFAULT_LOC_CONCURRENCY,
            progress_batch_size: extract::PROGRESS_BATCH_SIZE,
        }
    }
}

/// TOML-friendly export configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfigToml {
    /// Rows in the top-CWE table
    pub top_cwes: usize,
    /// Histogram bin width for lines of code
    pub loc_bin_width: usize,
    /// Histogram bin width for marked lines
    pub marked_lines_bin_width: usize,
}

impl Default for ExportConfigToml {
    fn default() -> Self {
        Self {
            top_cwes: export::DEFAULT_TOP_CWES,
            loc_bin_width: export::LOC_BIN_WIDTH,
            marked_lines_bin_width: export::MARKED_LINES_BIN_WIDTH,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag or RUST_LOG is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level
    pub fn parse_level(&self) -> ConfigResult<Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            })
    }

    /// Build the subscriber filter directives
    ///
    /// A verbosity flag sets this crate's level on top of `rust_log`. Without
    /// a flag, a non-empty `rust_log` is used unchanged, and the configured
    /// level applies only when both are absent.
    pub fn filter_directives(&self, flag: Option<Level>, rust_log: Option<&str>) -> String {
        let rust_log = rust_log.map(str::trim).filter(|value| !value.is_empty());

        match (flag, rust_log) {
            (Some(level), Some(base)) => format!("{},{}", base, crate_directive(level)),
            (Some(level), None) => crate_directive(level),
            (None, Some(base)) => base.to_string(),
            (None, None) => crate_directive(self.parse_level().unwrap_or(Level::WARN)),
        }
    }
}

fn crate_directive(level: Level) -> String {
    format!(
        "{}={}",
        logging::CRATE_TARGET,
        level.as_str().to_ascii_lowercase()
    )
}

fn threshold(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

impl ExtractConfigToml {
    /// Convert to runtime ExtractOptions
    pub fn to_runtime_config(&self, testcases_root: PathBuf) -> ExtractOptions {
        ExtractOptions {
            languages: self.languages.iter().cloned().collect(),
            exclude_header_files: self.exclude_header_files,
            max_lines_of_code: threshold(self.max_lines_of_code),
            max_marked_lines: threshold(self.max_marked_lines),
            compute_lines_of_code: self.compute_lines_of_code,
            file_count_mode: self.file_count_mode,
            testcases_root: Some(testcases_root),
            loc_concurrency: self.loc_concurrency,
            progress_batch_size: self.progress_batch_size,
        }
    }
}

impl ExportConfigToml {
    /// Convert to runtime ExportSettings
    pub fn to_runtime_config(&self) -> ExportSettings {
        ExportSettings {
            top_cwes: self.top_cwes,
            loc_bin_width: self.loc_bin_width,
            marked_lines_bin_width: self.marked_lines_bin_width,
        }
    }
}

impl AppConfig {
    /// Resolved storage layout
    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage.root)
    }

    /// Manifest location, explicit or under the storage root
    pub fn manifest_path(&self) -> PathBuf {
        self.storage
            .manifest
            .clone()
            .unwrap_or_else(|| self.storage_layout().manifest_path())
    }

    /// Runtime extraction options for this configuration
    pub fn to_extract_options(&self) -> ExtractOptions {
        let testcases = self
            .storage
            .testcases
            .clone()
            .unwrap_or_else(|| self.storage_layout().testcases_path());
        self.extract.to_runtime_config(testcases)
    }

    /// Check values that TOML alone cannot constrain
    pub fn validate(&self) -> ConfigResult<()> {
        if self.extract.languages.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extract.languages".to_string(),
                value: "[]".to_string(),
                reason: "At least one language is required".to_string(),
            });
        }
        if self.extract.loc_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "extract.loc_concurrency".to_string(),
                value: "0".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            ("export.loc_bin_width", self.export.loc_bin_width),
            (
                "export.marked_lines_bin_width",
                self.export.marked_lines_bin_width,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "Bin width must be greater than 0".to_string(),
                });
            }
        }
        self.logging.parse_level()?;
        Ok(())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// Command-line flags are applied by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => Self::load_from_file(&path).await?,
            Some(path) if config_file_override.is_some() => {
                return Err(ConfigError::NotFound { path });
            }
            _ => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(env::STORAGE_ROOT).filter(|value| !value.trim().is_empty()) {
            debug!("Storage root overridden by {}: {}", env::STORAGE_ROOT, root);
            self.storage.root = PathBuf::from(root);
        }
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file at `path` (or the user config location)
    /// unless one already exists. Returns the path and whether it was created.
    pub async fn initialize_first_run(path: Option<PathBuf>) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::WriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::WriteFailed {
                path: config_path.clone(),
                source,
            })?;

        Ok((config_path, true))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(paths::LOCAL_CONFIG_FILE)];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(paths::APP_DIR_NAME)
            .join(paths::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# SARD Explorer Configuration
# You can customize any of these settings to suit your needs.

[storage]
# Storage root holding external/, interim/, processed/ and outputs/
# (overridden by the {env_root} environment variable)
root = "{root}"

# Manifest location (default: <root>/external/{manifest})
# manifest = "/path/to/full_manifest.xml"

# Test-case sources (default: <root>/external/{testcases})
# testcases = "/path/to/testcases"

[extract]
# Languages kept by the language filter
languages = ["C", "C++"]

# Drop marked lines in .h files
exclude_header_files = true

# Keep test cases with fewer lines of code than this (0 = disabled)
max_lines_of_code = {max_loc}

# Keep test cases with fewer marked lines than this (0 = disabled)
max_marked_lines = {max_marked}

# Count non-blank lines of the flawed source files
compute_lines_of_code = true

# Total file count source: "actual" (file elements) or "declared" (numberOfFiles)
file_count_mode = "actual"

# Concurrent source-file reads
loc_concurrency = {concurrency}

# Test cases between progress log lines
progress_batch_size = {batch}

[export]
top_cwes = {top}
loc_bin_width = {loc_bin}
marked_lines_bin_width = {marked_bin}

[logging]
# Used when no -v/--very-verbose/-q flag and no RUST_LOG is given
level = "{level}"  # error, warn, info, debug, trace
"#,
            level = logging::DEFAULT_LEVEL,
            env_root = env::STORAGE_ROOT,
            root = storage::DEFAULT_ROOT,
            manifest = storage::MANIFEST_FILE_NAME,
            testcases = storage::TESTCASES_DIR,
            max_loc = extract::DEFAULT_MAX_LINES_OF_CODE,
            max_marked = extract::DEFAULT_MAX_MARKED_LINES,
            concurrency = extract::DEFAULT_LOC_CONCURRENCY,
            batch = extract::PROGRESS_BATCH_SIZE,
            top = export::DEFAULT_TOP_CWES,
            loc_bin = export::LOC_BIN_WIDTH,
            marked_bin = export::MARKED_LINES_BIN_WIDTH,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_matches_extract_defaults() {
        let config = AppConfig::default();
        let options = config.to_extract_options();

        let defaults = ExtractOptions::default();
        assert_eq!(options.languages, defaults.languages);
        assert_eq!(options.max_lines_of_code, Some(1000));
        assert_eq!(options.max_marked_lines, Some(15));
        assert_eq!(
            options.testcases_root,
            Some(PathBuf::from("storage/external/testcases"))
        );
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("storage/external/full_manifest.xml")
        );
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML equal to the defaults
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("# SARD Explorer Configuration"));
        assert!(content.contains("[extract]"));
    }

    #[test]
    fn test_zero_thresholds_disable_filters() {
        let config: AppConfig = toml::from_str(
            r#"
[extract]
max_lines_of_code = 0
max_marked_lines = 0
"#,
        )
        .unwrap();

        let options = config.to_extract_options();
        assert_eq!(options.max_lines_of_code, None);
        assert_eq!(options.max_marked_lines, None);
        assert!(options.compute_lines_of_code);
    }

    #[test]
    fn test_env_override_storage_root() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| {
            (key == "SARD_STORAGE_ROOT").then(|| "/data/sard".to_string())
        });
        assert_eq!(config.storage.root, PathBuf::from("/data/sard"));

        let mut untouched = AppConfig::default();
        untouched.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.storage.root, PathBuf::from("storage"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.extract.languages.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = AppConfig::default();
        config.export.loc_bin_width = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
        ));
    }

    /// Test log filter precedence.
    ///
    /// Purpose: Verifies that verbosity flags beat `RUST_LOG`, that `RUST_LOG`
    /// is used unchanged without a flag, and that the configured level is the
    /// fallback when neither is present.
    /// Benefit: `[logging] level` and `RUST_LOG` both take effect.
    #[test]
    fn test_logging_filter_directives() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
        };

        assert_eq!(logging.filter_directives(None, None), "sard_explorer=debug");
        assert_eq!(logging.filter_directives(None, Some("  ")), "sard_explorer=debug");
        assert_eq!(
            logging.filter_directives(None, Some("sard_explorer=trace")),
            "sard_explorer=trace"
        );
        assert_eq!(
            logging.filter_directives(Some(Level::INFO), None),
            "sard_explorer=info"
        );
        assert_eq!(
            logging.filter_directives(Some(Level::ERROR), Some("tokio=debug")),
            "tokio=debug,sard_explorer=error"
        );

        let defaults = LoggingConfig::default();
        assert_eq!(defaults.parse_level().unwrap(), Level::WARN);
        assert_eq!(defaults.filter_directives(None, None), "sard_explorer=warn");
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        // Should fail when explicitly specified
        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let test_config = r#"
[storage]
root = "/srv/sard"
manifest = "/srv/manifests/full_manifest.xml"

[extract]
languages = ["C"]
file_count_mode = "declared"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        // Verify custom values were loaded
        assert_eq!(config.extract.languages, vec!["C".to_string()]);
        assert_eq!(config.extract.file_count_mode, FileCountMode::Declared);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/srv/manifests/full_manifest.xml")
        );

        // Verify defaults are still present for unspecified values
        assert_eq!(config.extract.max_marked_lines, 15);
        assert_eq!(config.export.top_cwes, 10);
    }

    #[tokio::test]
    async fn test_initialize_first_run_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let (path, created) = AppConfig::initialize_first_run(Some(config_path.clone()))
            .await
            .unwrap();
        assert_eq!(path, config_path);
        assert!(created);

        let (_, created_again) = AppConfig::initialize_first_run(Some(config_path.clone()))
            .await
            .unwrap();
        assert!(!created_again);

        let written = std::fs::read_to_string(&config_path).unwrap();
        let parsed: AppConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_show_round_trips() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
