//! `bgremove-urls`: remove backgrounds from a comma-separated list of image URLs

use super::common::{create_cli_progress_reporter, init_tracing, run_batch, RemoverArgs};
use crate::{
    backends::{DefaultRemoverFactory, RemoverFactory, RemoverSettings},
    config::{BatchConfig, DEFAULT_OUTPUT_DIR},
    error::BatchError,
    naming::NamingScheme,
    processor::BatchProcessor,
    source::{parse_url_list, ImageSource},
    tracing_config::spans,
    types::RunReport,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Instrument;

/// Download images and remove their backgrounds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-urls")]
pub struct UrlsCli {
    /// Actually download and process; without this flag only the plan is printed
    #[arg(long)]
    pub process: bool,

    /// Comma-separated list of image URLs
    #[arg(long, required = true, value_name = "URLS")]
    pub urls: String,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Skip URLs whose output file already exists
    #[arg(long)]
    pub skip_existing: bool,

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

impl UrlsCli {
    /// Sources in the order given
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the list has no usable entry
    pub fn sources(&self) -> crate::Result<Vec<ImageSource>> {
        let sources = parse_url_list(&self.urls);
        if sources.is_empty() {
            return Err(BatchError::invalid_config("--urls contains no URLs"));
        }
        Ok(sources)
    }

    pub fn batch_config(&self) -> crate::Result<BatchConfig> {
        BatchConfig::builder()
            .output_dir(&self.output)
            .commit(self.process)
            .skip_existing(self.skip_existing)
            .naming(NamingScheme::DashNoBg)
            .build()
    }

    #[must_use]
    pub fn remover_settings(&self) -> RemoverSettings {
        let mut settings = RemoverSettings::default();
        self.remover.apply_to(&mut settings);
        settings
    }

    /// Build the processor this invocation describes, with its console reporter
    pub fn processor(&self) -> Result<BatchProcessor> {
        let config = self.batch_config().context("Invalid configuration")?;
        let remover = DefaultRemoverFactory
            .create_remover(&self.remover_settings())
            .context("Failed to create background remover")?;
        Ok(BatchProcessor::new(config, remover)?
            .with_reporter(create_cli_progress_reporter(self.progress, self.verbose > 0)))
    }
}

/// Run a parsed invocation; per-item failures do not make this fail
pub async fn run(cli: &UrlsCli) -> Result<RunReport> {
    let sources = cli.sources().context("Invalid --urls")?;
    let processor = cli.processor()?;

    tracing::info!(
        count = sources.len(),
        remover = %processor.remover_name(),
        output = %cli.output.display(),
        "Starting URL batch"
    );

    let report = run_batch(&processor, &sources, cli.report.as_deref()).await?;

    if !cli.process {
        println!("\nRun with --process to actually remove backgrounds.");
    }

    Ok(report)
}

pub async fn main() -> Result<()> {
    let cli = UrlsCli::parse();

    let session_id = init_tracing(cli.verbose)?;

    run(&cli).instrument(spans::session(&session_id)).await?;
    Ok(())
}
