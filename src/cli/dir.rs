//! `bgremove-dir`: remove backgrounds from every matching image in a directory

use super::common::{create_cli_progress_reporter, init_tracing, write_report, RemoverArgs};
use crate::{
    backends::{DefaultRemoverFactory, RemoverFactory, RemoverSettings},
    config::BatchConfig,
    error::{BatchError, Result as BatchResult},
    naming::NamingScheme,
    processor::BatchProcessor,
    scan::ScanConfig,
    tracing_config::spans,
    types::RunReport,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Default output directory, inside the default input directory
pub const DEFAULT_DIR_OUTPUT: &str = "images/products/nobg";

/// Everything a directory run needs; loadable from a JSON file
///
/// ```json
/// {
///   "input_dir": "assets/shoes",
///   "pattern": "*.png",
///   "exclude_substring": "_alt",
///   "output_dir": "assets/shoes/cutout",
///   "remover": { "kind": "color-key", "color_threshold": 24 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirRunConfig {
    #[serde(flatten)]
    pub scan: ScanConfig,
    pub output_dir: PathBuf,
    pub commit: bool,
    pub skip_existing: bool,
    pub remover: RemoverSettings,
}

impl Default for DirRunConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            output_dir: PathBuf::from(DEFAULT_DIR_OUTPUT),
            commit: true,
            skip_existing: true,
            remover: RemoverSettings::default(),
        }
    }
}

impl DirRunConfig {
    /// Load a configuration file; missing keys take their defaults
    ///
    /// # Errors
    /// - `FileAccess` if the file cannot be read
    /// - `InvalidConfig` if it is not valid JSON for this structure
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> BatchResult<Self> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref)
            .map_err(|e| BatchError::file_io_error("read config file", path_ref, &e))?;
        serde_json::from_str(&text).map_err(|e| {
            BatchError::invalid_config(format!("{}: {}", path_ref.display(), e))
        })
    }

    pub fn batch_config(&self) -> BatchResult<BatchConfig> {
        BatchConfig::builder()
            .output_dir(&self.output_dir)
            .commit(self.commit)
            .skip_existing(self.skip_existing)
            .naming(NamingScheme::UnderscoreNoBg)
            .build()
    }
}

/// Remove backgrounds from product photos in a directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-dir")]
#[allow(clippy::struct_excessive_bools)]
pub struct DirCli {
    /// Directory to scan [default: images/products]
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Output directory [default: images/products/nobg]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Glob matched against file names [default: *.jpg]
    #[arg(long)]
    pub pattern: Option<String>,

    /// Skip files whose name contains this text; pass "" to disable [default: _alt]
    #[arg(long, value_name = "TEXT")]
    pub exclude: Option<String>,

    /// Scan subdirectories too
    #[arg(short, long)]
    pub recursive: bool,

    /// Print what would be done without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Reprocess images whose output already exists
    #[arg(long)]
    pub no_skip_existing: bool,

    /// JSON configuration file; command-line flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub remover: RemoverArgs,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Show a progress bar instead of plain lines
    #[arg(long)]
    pub progress: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DirCli {
    /// Defaults, then the config file, then explicit flags
    pub fn resolve(&self) -> BatchResult<DirRunConfig> {
        let mut run = match &self.config {
            Some(path) => DirRunConfig::from_json_file(path)?,
            None => DirRunConfig::default(),
        };

        if let Some(input) = &self.input {
            run.scan.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            run.output_dir = output.clone();
        }
        if let Some(pattern) = &self.pattern {
            run.scan.pattern = pattern.clone();
        }
        if let Some(exclude) = &self.exclude {
            run.scan.exclude_substring = Some(exclude.clone()).filter(|e| !e.is_empty());
        }
        if self.recursive {
            run.scan.recursive = true;
        }
        if self.dry_run {
            run.commit = false;
        }
        if self.no_skip_existing {
            run.skip_existing = false;
        }
        self.remover.apply_to(&mut run.remover);

        Ok(run)
    }
}

/// Run a parsed invocation; per-item failures do not make this fail
pub async fn run(cli: &DirCli) -> Result<RunReport> {
    let run_config = cli.resolve().context("Invalid configuration")?;
    let config = run_config.batch_config().context("Invalid configuration")?;
    let remover = DefaultRemoverFactory
        .create_remover(&run_config.remover)
        .context("Failed to create background remover")?;
    let processor = BatchProcessor::new(config, remover)?
        .with_reporter(create_cli_progress_reporter(cli.progress, cli.verbose > 0));

    processor
        .check_setup()
        .await
        .context("Background remover is not available")?;

    tracing::info!(
        input = %run_config.scan.input_dir.display(),
        pattern = %run_config.scan.pattern,
        output = %run_config.output_dir.display(),
        remover = %processor.remover_name(),
        "Starting directory batch"
    );

    let report = crate::process_directory(&processor, &run_config.scan)
        .await
        .with_context(|| {
            format!(
                "Failed to scan input directory {}",
                run_config.scan.input_dir.display()
            )
        })?;
    write_report(&report, cli.report.as_deref())?;

    if !run_config.commit {
        println!("\nRun without --dry-run to write the images.");
    }

    Ok(report)
}

pub async fn main() -> Result<()> {
    let cli = DirCli::parse();

    let session_id = init_tracing(cli.verbose)?;

    run(&cli).instrument(spans::session(&session_id)).await?;
    Ok(())
}
