//! Command-line interface components
//!
//! This module contains CLI-specific code for the SARD Explorer application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, ExportArgs, ExtractArgs, GlobalArgs, PipelineArgs,
    ValidateArgs,
};
pub use commands::{
    handle_config, handle_export, handle_extract, handle_storage, handle_validate, resolve_config,
};
pub use progress::StageSpinner;
