//! Batch background removal processor
//!
//! `BatchProcessor` walks an ordered list of sources and drives each one
//! through acquire → normalize → transform → persist. Every item ends in
//! exactly one [`ItemOutcome`]; a failing item never stops the batch.

use crate::{
    config::BatchConfig,
    download::{ImageDownloader, SourceFetcher},
    error::{BatchError, Result},
    naming,
    remover::BackgroundRemover,
    services::{ImageIOService, NoOpProgressReporter, ProcessingStage, ProgressReporter},
    source::ImageSource,
    tracing_config::spans,
    types::{ItemOutcome, ItemRecord, RunReport, RunSummary},
};
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Sequential batch processor
pub struct BatchProcessor {
    config: BatchConfig,
    remover: Box<dyn BackgroundRemover>,
    fetcher: Box<dyn SourceFetcher>,
    reporter: Box<dyn ProgressReporter>,
}

impl BatchProcessor {
    /// Create a processor with the default HTTP/filesystem fetcher and no progress output
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Setup` if the HTTP client cannot be created
    pub fn new(config: BatchConfig, remover: Box<dyn BackgroundRemover>) -> Result<Self> {
        Ok(Self {
            config,
            remover,
            fetcher: Box::new(ImageDownloader::new()?),
            reporter: Box::new(NoOpProgressReporter),
        })
    }

    /// Replace the source fetcher
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the progress reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    #[must_use]
    pub fn remover_name(&self) -> &str {
        self.remover.name()
    }

    /// Verify the remover can run before any item is touched
    ///
    /// Dry runs never invoke the remover, so they skip the check.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Setup` when the remover's dependency is missing
    pub async fn check_setup(&self) -> Result<()> {
        if self.config.is_dry_run() {
            debug!("Dry run: skipping remover availability check");
            return Ok(());
        }
        self.remover.check_available().await?;
        info!(remover = %self.remover.name(), "Remover available");
        Ok(())
    }

    /// Destination path for a source under this processor's configuration
    #[must_use]
    pub fn output_path_for(&self, source: &ImageSource) -> PathBuf {
        naming::output_path(source, &self.config.output_dir, &self.config.naming)
    }

    /// Process a single source
    pub async fn process_item(&self, source: &ImageSource) -> ItemOutcome {
        let output = self.output_path_for(source);
        self.process_item_at(source, output).await
    }

    /// Process every source in order and return the summary
    pub async fn run(&self, sources: &[ImageSource]) -> RunSummary {
        self.run_with_report(sources).await.summary
    }

    /// Process every source in order and return the full report
    pub async fn run_with_report(&self, sources: &[ImageSource]) -> RunReport {
        self.run_items(sources)
            .instrument(spans::batch_processing(
                sources.len(),
                self.config.is_dry_run(),
            ))
            .await
    }

    async fn run_items(&self, sources: &[ImageSource]) -> RunReport {
        let started_at = Utc::now();
        let batch_start = Instant::now();
        let total = sources.len();
        let mut summary = RunSummary::new(total);
        let mut items = Vec::with_capacity(total);
        let mut claimed_outputs: HashSet<PathBuf> = HashSet::with_capacity(total);

        info!(
            total,
            dry_run = self.config.is_dry_run(),
            output_dir = %self.config.output_dir.display(),
            "Starting batch"
        );
        self.reporter.report_start(total, self.config.is_dry_run());

        if !self.config.is_dry_run() {
            let removed = ImageIOService::remove_stale_temp_files(&self.config.output_dir);
            if removed > 0 {
                info!(removed, "Removed temporary files left by an interrupted run");
            }
        }

        for (position, source) in sources.iter().enumerate() {
            let index = position + 1;
            let output = self.output_path_for(source);

            if !claimed_outputs.insert(output.clone()) {
                warn!(
                    source = %source,
                    output = %output.display(),
                    "Output path already used by an earlier source in this run"
                );
                self.reporter.report_warning(&format!(
                    "{} resolves to {}, already used earlier in this run",
                    source,
                    output.display()
                ));
            }

            let outcome = self
                .process_item_at(source, output)
                .instrument(spans::item_processing(index, total, source))
                .await;

            summary.record(outcome.status());
            self.reporter.report_item(index, total, source, &outcome);
            items.push(ItemRecord::new(index, source, &outcome));
        }

        debug_assert!(summary.is_complete());
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            dry_run = summary.dry_run,
            elapsed_ms = batch_start.elapsed().as_millis() as u64,
            "Batch finished"
        );
        self.reporter.report_summary(&summary);

        RunReport {
            started_at,
            finished_at: Utc::now(),
            summary,
            items,
        }
    }

    async fn process_item_at(&self, source: &ImageSource, output: PathBuf) -> ItemOutcome {
        if self.config.skip_existing && output.exists() {
            debug!(output = %output.display(), "Output exists, skipping");
            return ItemOutcome::Skipped { output };
        }

        if self.config.is_dry_run() {
            return ItemOutcome::DryRun { output };
        }

        match self.execute(source, &output).await {
            Ok(bytes_written) => {
                info!(
                    output = %output.display(),
                    bytes_written,
                    "Background removed"
                );
                ItemOutcome::Succeeded {
                    output,
                    bytes_written,
                }
            },
            Err(error) => {
                info!(kind = %error.kind(), error = %error, "Item failed");
                ItemOutcome::Failed { output, error }
            },
        }
    }

    async fn execute(&self, source: &ImageSource, output: &Path) -> Result<u64> {
        self.reporter.report_stage(ProcessingStage::Acquiring, source);
        let raw = self.fetcher.fetch(source).await?;

        self.reporter.report_stage(ProcessingStage::Normalizing, source);
        let png = ImageIOService::prepare_for_removal(&raw, &source.display_name())?;

        self.reporter
            .report_stage(ProcessingStage::RemovingBackground, source);
        let removed = self.remover.remove(&png).await.map_err(|e| match e {
            BatchError::Transform(_) => e,
            other => BatchError::transform_error_with_remover(self.remover.name(), &other.to_string()),
        })?;
        let image = ImageIOService::load_removal_output(&removed, self.remover.name())?;

        self.reporter.report_stage(ProcessingStage::Saving, source);
        ImageIOService::write_png_atomic(&image, output)
    }
}
