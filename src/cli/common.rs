//! Pieces shared by both command-line entry points

use crate::{
    backends::{RemoverKind, RemoverSettings},
    processor::BatchProcessor,
    services::{
        format_item_line, format_summary, ConsoleProgressReporter, ProcessingStage,
        ProgressReporter,
    },
    source::ImageSource,
    types::{ItemOutcome, RunReport, RunSummary},
};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Remover choice on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliRemover {
    Rembg,
    RemoveBg,
    ColorKey,
}

impl From<CliRemover> for RemoverKind {
    fn from(value: CliRemover) -> Self {
        match value {
            CliRemover::Rembg => RemoverKind::Rembg,
            CliRemover::RemoveBg => RemoverKind::RemoveBg,
            CliRemover::ColorKey => RemoverKind::ColorKey,
        }
    }
}

/// Remover flags; unset flags leave the underlying settings untouched
#[derive(Args, Debug, Clone, Default)]
pub struct RemoverArgs {
    /// Background remover to use [default: rembg]
    #[arg(long, value_enum)]
    pub remover: Option<CliRemover>,

    /// Path to the rembg executable [default: rembg]
    #[arg(long, value_name = "PATH")]
    pub rembg_bin: Option<PathBuf>,

    /// rembg model name (e.g. u2net, isnet-general-use)
    #[arg(long, value_name = "MODEL")]
    pub rembg_model: Option<String>,

    /// remove.bg API key
    #[arg(long, env = "REMOVE_BG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// remove.bg API endpoint
    #[arg(long, value_name = "URL")]
    pub api_endpoint: Option<String>,

    /// Minimum milliseconds between remove.bg requests [default: 1000]
    #[arg(long, value_name = "MS")]
    pub api_interval_ms: Option<u64>,

    /// Color distance under which pixels count as background (color-key only)
    #[arg(long, value_name = "0-255")]
    pub color_threshold: Option<u8>,
}

impl RemoverArgs {
    /// Overlay the flags that were given onto `settings`
    pub fn apply_to(&self, settings: &mut RemoverSettings) {
        if let Some(remover) = self.remover {
            settings.kind = remover.into();
        }
        if let Some(program) = &self.rembg_bin {
            settings.rembg_program = program.clone();
        }
        if let Some(model) = &self.rembg_model {
            settings.rembg_model = Some(model.clone());
        }
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(endpoint) = &self.api_endpoint {
            settings.api_endpoint = endpoint.clone();
        }
        if let Some(interval) = self.api_interval_ms {
            settings.api_min_interval_ms = interval;
        }
        if let Some(threshold) = self.color_threshold {
            settings.color_threshold = threshold;
        }
    }
}

/// Progress reporter drawing an indicatif bar, with item lines printed above it
pub struct IndicatifProgressReporter {
    bar: ProgressBar,
}

impl IndicatifProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for IndicatifProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifProgressReporter {
    fn report_start(&self, total: usize, dry_run: bool) {
        self.bar.set_length(total as u64);
        if dry_run {
            self.bar.set_message("dry run");
        }
    }

    fn report_stage(&self, stage: ProcessingStage, source: &ImageSource) {
        self.bar
            .set_message(format!("{} {}", stage.description(), source));
    }

    fn report_item(&self, index: usize, total: usize, source: &ImageSource, outcome: &ItemOutcome) {
        // `ProgressBar::println` is dropped when the bar is hidden, so print to stdout directly
        let line = format_item_line(index, total, source, outcome);
        self.bar.suspend(|| println!("{}", line));
        self.bar.inc(1);
    }

    fn report_warning(&self, message: &str) {
        self.bar.suspend(|| println!("⚠️  {}", message));
    }

    fn report_summary(&self, summary: &RunSummary) {
        self.bar.finish_and_clear();
        println!("\n{}", format_summary(summary));
    }
}

/// Pick the reporter for the `--progress` and `-v` flags
#[must_use]
pub fn create_cli_progress_reporter(progress: bool, verbose: bool) -> Box<dyn ProgressReporter> {
    if progress {
        Box::new(IndicatifProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new(verbose))
    }
}

/// Initialize tracing based on verbosity level
pub(crate) fn init_tracing(verbose_count: u8) -> Result<String> {
    crate::tracing_config::init_cli_tracing(verbose_count)
        .context("Failed to initialize tracing subscriber")
}

/// Check the remover, then process `sources` and optionally write the JSON report
///
/// # Errors
///
/// Fails before any item is processed when the remover is unavailable,
/// and after the loop when the report cannot be written.
pub async fn run_batch(
    processor: &BatchProcessor,
    sources: &[ImageSource],
    report_path: Option<&Path>,
) -> Result<RunReport> {
    processor
        .check_setup()
        .await
        .context("Background remover is not available")?;

    let report = processor.run_with_report(sources).await;
    write_report(&report, report_path)?;
    Ok(report)
}

pub(crate) fn write_report(report: &RunReport, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Run report written");
    }
    Ok(())
}
