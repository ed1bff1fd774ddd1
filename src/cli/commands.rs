//! Command handlers for the SARD Explorer CLI
//!
//! Each handler resolves the effective configuration (file, environment,
//! flags), runs the requested operation and prints a short report.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::app::export::{write_dataset, TableExporter};
use crate::app::manifest::{analysis, count_test_cases, extract_manifest, Extraction};
use crate::cli::args::{
    ConfigAction, ConfigArgs, ExportArgs, ExtractArgs, GlobalArgs, PipelineArgs, ValidateArgs,
};
use crate::cli::progress::StageSpinner;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Load the configuration and apply global flag overrides
pub async fn resolve_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(ref root) = global.storage_root {
        debug!("Storage root overridden on the command line: {}", root.display());
        config.storage.root = root.clone();
    }
    Ok(config)
}

/// Run the extraction pipeline with configuration and flags applied
async fn run_pipeline(
    global: &GlobalArgs,
    config: &AppConfig,
    pipeline: &PipelineArgs,
) -> Result<Extraction> {
    pipeline.validate().map_err(AppError::generic)?;

    let options = pipeline.apply(config.to_extract_options());
    let manifest_path = pipeline
        .manifest
        .clone()
        .unwrap_or_else(|| config.manifest_path());

    info!(
        "Extracting {} with languages {}",
        manifest_path.display(),
        options.languages_label()
    );

    let spinner = StageSpinner::start(
        format!("Processing manifest {}...", manifest_path.display()),
        global.quiet,
    );
    let result = extract_manifest(&manifest_path, options).await;
    spinner.clear();

    Ok(result?)
}

fn print_report(extraction: &Extraction) {
    println!("{}", extraction.attrition);
    println!();

    let summary = analysis::overview(&extraction.records);
    println!("📊 Dataset summary:");
    println!("   Test cases:    {}", summary.test_cases);
    println!(
        "   Marked lines:  {} ({} flaw, {} mixed)",
        summary.marked_lines, summary.flaw_lines, summary.mixed_lines
    );
    println!("   Flawed files:  {}", summary.flawed_files);
    println!("   Distinct CWEs: {}", summary.distinct_cwes);
    if let Some(loc) = summary.lines_of_code {
        println!("   Lines of code: {}", loc);
    }
}

/// Handle the extract command
pub async fn handle_extract(global: &GlobalArgs, args: ExtractArgs) -> Result<()> {
    let config = resolve_config(global).await?;
    let extraction = run_pipeline(global, &config, &args.pipeline).await?;

    if !global.quiet {
        print_report(&extraction);
    }

    if let Some(output) = args.output {
        write_dataset(&output, &extraction).await?;
        if !global.quiet {
            println!();
            println!("💾 Wrote {} records to {}", extraction.len(), output.display());
        }
    }

    Ok(())
}

/// Handle the export command
pub async fn handle_export(global: &GlobalArgs, args: ExportArgs) -> Result<()> {
    let config = resolve_config(global).await?;
    let extraction = run_pipeline(global, &config, &args.pipeline).await?;

    let mut settings = config.export.to_runtime_config();
    if let Some(top) = args.top {
        settings.top_cwes = top;
    }

    let exporter = TableExporter::new(config.storage_layout(), settings);
    let mut written = exporter.write_tables(&extraction).await?;
    written.push(exporter.write_dataset(&extraction).await?);

    if !global.quiet {
        print_report(&extraction);
        println!();
        println!("📁 Wrote {} files:", written.len());
        for path in &written {
            println!("   {}", path.display());
        }
    }

    Ok(())
}

/// Handle the validate command
pub async fn handle_validate(global: &GlobalArgs, args: ValidateArgs) -> Result<usize> {
    let config = resolve_config(global).await?;
    let manifest_path = args.manifest.unwrap_or_else(|| config.manifest_path());

    let spinner = StageSpinner::start(
        format!("Validating manifest {}...", manifest_path.display()),
        global.quiet,
    );
    match count_test_cases(&manifest_path).await {
        Ok(count) => {
            spinner.finish(format!(
                "✅ {} test cases in {}",
                count,
                manifest_path.display()
            ));
            Ok(count)
        }
        Err(e) => {
            spinner.clear();
            Err(e.into())
        }
    }
}

/// Handle the storage command
pub async fn handle_storage(global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global).await?;
    let layout = config.storage_layout();
    let directories = layout.ensure_all()?;

    println!("📁 Storage root: {}", layout.root().display());
    for (category, path) in directories {
        println!("   {:<10} {}", category.to_string(), path.display());
    }
    println!("   {:<10} {}", "manifest", config.manifest_path().display());

    let testcases: PathBuf = config
        .to_extract_options()
        .testcases_root
        .unwrap_or_else(|| layout.testcases_path());
    println!("   {:<10} {}", "testcases", testcases.display());
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let (path, created) = AppConfig::initialize_first_run(path).await?;
            if created {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = resolve_config(global).await?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
