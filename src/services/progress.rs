//! Progress reporting service
//!
//! Separates user-facing output from the batch loop so the CLI, tests and
//! library callers can each decide what to show.

use crate::{
    source::ImageSource,
    types::{format_size, ItemOutcome, RunSummary},
};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Steps an item goes through while being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Downloading or reading the source
    Acquiring,
    /// Decoding and adding an alpha channel
    Normalizing,
    /// Running the remover
    RemovingBackground,
    /// Writing the PNG
    Saving,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Acquiring => "Acquiring source image",
            ProcessingStage::Normalizing => "Normalizing color mode",
            ProcessingStage::RemovingBackground => "Removing background",
            ProcessingStage::Saving => "Saving result",
        }
    }
}

/// Trait for reporting batch progress
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first item
    fn report_start(&self, total: usize, dry_run: bool);

    /// Called as an item enters a stage
    fn report_stage(&self, stage: ProcessingStage, source: &ImageSource) {
        let _ = (stage, source);
    }

    /// Called once per item with its final outcome; `index` is 1-based
    fn report_item(&self, index: usize, total: usize, source: &ImageSource, outcome: &ItemOutcome);

    /// Called for conditions worth surfacing that do not fail an item
    fn report_warning(&self, message: &str) {
        let _ = message;
    }

    /// Called once after the last item
    fn report_summary(&self, summary: &RunSummary);
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for Arc<R> {
    fn report_start(&self, total: usize, dry_run: bool) {
        (**self).report_start(total, dry_run);
    }

    fn report_stage(&self, stage: ProcessingStage, source: &ImageSource) {
        (**self).report_stage(stage, source);
    }

    fn report_item(&self, index: usize, total: usize, source: &ImageSource, outcome: &ItemOutcome) {
        (**self).report_item(index, total, source, outcome);
    }

    fn report_warning(&self, message: &str) {
        (**self).report_warning(message);
    }

    fn report_summary(&self, summary: &RunSummary) {
        (**self).report_summary(summary);
    }
}

/// One-line description of an item outcome
#[must_use]
pub fn format_item_line(
    index: usize,
    total: usize,
    source: &ImageSource,
    outcome: &ItemOutcome,
) -> String {
    let prefix = format!("[{}/{}]", index, total);
    match outcome {
        ItemOutcome::Succeeded {
            output,
            bytes_written,
        } => format!(
            "{} ✅ {} -> {} ({})",
            prefix,
            source,
            output.display(),
            format_size(*bytes_written)
        ),
        ItemOutcome::Failed { error, .. } => format!("{} ❌ {}: {}", prefix, source, error),
        ItemOutcome::Skipped { output } => format!(
            "{} ⏭️  {}: {} already exists, skipping",
            prefix,
            source,
            output.display()
        ),
        ItemOutcome::DryRun { output } => format!(
            "{} [DRY RUN] {} -> {}",
            prefix,
            source,
            output.display()
        ),
    }
}

/// Multi-line run summary
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![
        format!("📊 Batch summary: {} image(s) requested", summary.total),
        format!("  ├─ Succeeded: {}", summary.succeeded),
        format!("  ├─ Failed: {}", summary.failed),
    ];
    if summary.dry_run > 0 {
        lines.push(format!("  ├─ Skipped: {}", summary.skipped));
        lines.push(format!("  └─ Dry run: {}", summary.dry_run));
    } else {
        lines.push(format!("  └─ Skipped: {}", summary.skipped));
    }
    lines.join("\n")
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_start(&self, _total: usize, _dry_run: bool) {}

    fn report_item(&self, _index: usize, _total: usize, _source: &ImageSource, _outcome: &ItemOutcome) {}

    fn report_summary(&self, _summary: &RunSummary) {}
}

/// Console progress reporter: one line per item, then the summary
pub struct ConsoleProgressReporter {
    out: Mutex<Box<dyn Write + Send>>,
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a reporter writing to stdout
    ///
    /// # Arguments
    /// * `verbose` - Also print a line for every processing stage
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), verbose)
    }

    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>, verbose: bool) -> Self {
        Self {
            out: Mutex::new(out),
            verbose,
        }
    }

    fn emit(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            // Progress output is best effort; a closed stdout must not fail the batch
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_start(&self, total: usize, dry_run: bool) {
        if dry_run {
            self.emit(&format!("🔍 {} image(s) found (dry run, nothing will be written)\n", total));
        } else {
            self.emit(&format!("🔍 Processing {} image(s)...\n", total));
        }
    }

    fn report_stage(&self, stage: ProcessingStage, source: &ImageSource) {
        if self.verbose {
            self.emit(&format!("  {} ({})", stage.description(), source));
        }
    }

    fn report_item(&self, index: usize, total: usize, source: &ImageSource, outcome: &ItemOutcome) {
        self.emit(&format_item_line(index, total, source, outcome));
    }

    fn report_warning(&self, message: &str) {
        self.emit(&format!("⚠️  {}", message));
    }

    fn report_summary(&self, summary: &RunSummary) {
        self.emit(&format!("\n{}", format_summary(summary)));
    }
}

/// Event captured by [`RecordingProgressReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { total: usize, dry_run: bool },
    Stage { stage: ProcessingStage, source: ImageSource },
    Item { index: usize, source: ImageSource, line: String },
    Warning(String),
    Summary(RunSummary),
}

/// Reporter that keeps every event in memory
#[derive(Default)]
pub struct RecordingProgressReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Sources in the order their outcomes were reported
    #[must_use]
    pub fn item_order(&self) -> Vec<ImageSource> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Item { source, .. } => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Warning messages, in order
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Stages entered, in order
    #[must_use]
    pub fn stages(&self) -> Vec<ProcessingStage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Stage { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressReporter for RecordingProgressReporter {
    fn report_start(&self, total: usize, dry_run: bool) {
        self.push(ProgressEvent::Start { total, dry_run });
    }

    fn report_stage(&self, stage: ProcessingStage, source: &ImageSource) {
        self.push(ProgressEvent::Stage {
            stage,
            source: source.clone(),
        });
    }

    fn report_item(&self, index: usize, total: usize, source: &ImageSource, outcome: &ItemOutcome) {
        self.push(ProgressEvent::Item {
            index,
            source: source.clone(),
            line: format_item_line(index, total, source, outcome),
        });
    }

    fn report_warning(&self, message: &str) {
        self.push(ProgressEvent::Warning(message.to_string()));
    }

    fn report_summary(&self, summary: &RunSummary) {
        self.push(ProgressEvent::Summary(*summary));
    }
}
