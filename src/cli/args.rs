//! Command-line argument parsing for SARD Explorer
//!
//! This module defines the CLI structure using clap derive macros: dataset
//! extraction, table export, storage layout inspection and configuration
//! management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::manifest::types::{ExtractOptions, FileCountMode};

/// SARD Explorer - Build vulnerability datasets from the SARD manifest
#[derive(Parser, Debug)]
#[command(
    name = "sard_explorer",
    version,
    about = "Extract flawed-line datasets from the NIST SARD manifest",
    long_about = "Reads the SARD manifest, keeps C/C++ test cases with flaw annotations and no fixes,
and summarizes each into one record with its marked lines, CWEs and source size."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Storage root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the extraction and print the attrition report
    Extract(ExtractArgs),

    /// Run the extraction and write tables and the processed dataset
    Export(ExportArgs),

    /// Parse the whole manifest and count its test cases
    Validate(ValidateArgs),

    /// Show (and create) the storage directories
    Storage,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Pipeline settings shared by `extract` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Manifest file (default: <storage>/external/full_manifest.xml)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Test-case source directory (default: <storage>/external/testcases)
    #[arg(long, value_name = "DIR")]
    pub testcases: Option<PathBuf>,

    /// Language to keep (repeatable; replaces the configured languages)
    #[arg(short, long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Keep marked lines in header files
    #[arg(long)]
    pub include_headers: bool,

    /// Keep test cases with fewer lines of code than this (0 = disabled)
    #[arg(long, value_name = "N")]
    pub max_loc: Option<usize>,

    /// Keep test cases with fewer marked lines than this (0 = disabled)
    #[arg(long, value_name = "N")]
    pub max_marked: Option<usize>,

    /// Disable both thresholds
    #[arg(long)]
    pub no_thresholds: bool,

    /// Skip counting lines of code
    #[arg(long)]
    pub no_loc: bool,

    /// Source of the total file count: actual or declared
    #[arg(long, value_name = "MODE")]
    pub file_count: Option<FileCountMode>,

    /// Concurrent source-file reads
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

/// Arguments for the extract command
#[derive(Args, Debug, Clone, Default)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Also write the records and attrition report as JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the export command
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Rows in the top-CWE table
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Manifest file (default: <storage>/external/full_manifest.xml)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Where to write it (default: user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level requested by verbosity flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl PipelineArgs {
    /// Reject flag combinations that cannot both hold
    pub fn validate(&self) -> Result<(), String> {
        if self.no_thresholds && (self.max_loc.is_some() || self.max_marked.is_some()) {
            return Err("Cannot combine --no-thresholds with --max-loc or --max-marked".to_string());
        }
        if self.concurrency == Some(0) {
            return Err("Concurrency must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Apply the flags on top of configured options
    pub fn apply(&self, mut options: ExtractOptions) -> ExtractOptions {
        if !self.languages.is_empty() {
            options = options.with_languages(self.languages.iter().cloned());
        }
        if self.include_headers {
            options.exclude_header_files = false;
        }
        if let Some(max) = self.max_loc {
            options.max_lines_of_code = (max > 0).then_some(max);
        }
        if let Some(max) = self.max_marked {
            options.max_marked_lines = (max > 0).then_some(max);
        }
        if self.no_thresholds {
            options.max_lines_of_code = None;
            options.max_marked_lines = None;
        }
        if self.no_loc {
            options.compute_lines_of_code = false;
        }
        if let Some(mode) = self.file_count {
            options.file_count_mode = mode;
        }
        if let Some(concurrency) = self.concurrency {
            options.loc_concurrency = concurrency;
        }
        if let Some(ref root) = self.testcases {
            options = options.with_testcases_root(root);
        }
        options
    }
}
