//! Per-item outcomes and run-level summaries

use crate::error::{BatchError, ErrorKind, Result};
use crate::source::ImageSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Final state of one item: `Pending` resolves to exactly one of these
#[derive(Debug)]
pub enum ItemOutcome {
    /// Output already existed; nothing was done
    Skipped { output: PathBuf },
    /// Dry run; nothing was done
    DryRun { output: PathBuf },
    /// Output written
    Succeeded { output: PathBuf, bytes_written: u64 },
    /// Acquire, transform or persist failed
    Failed { output: PathBuf, error: BatchError },
}

/// Coarse status of an item, as counted in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Skipped,
    DryRun,
    Succeeded,
    Failed,
}

impl ItemOutcome {
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        match self {
            Self::Skipped { .. } => ItemStatus::Skipped,
            Self::DryRun { .. } => ItemStatus::DryRun,
            Self::Succeeded { .. } => ItemStatus::Succeeded,
            Self::Failed { .. } => ItemStatus::Failed,
        }
    }

    /// Destination path resolved for the item
    #[must_use]
    pub fn output(&self) -> &Path {
        match self {
            Self::Skipped { output }
            | Self::DryRun { output }
            | Self::Succeeded { output, .. }
            | Self::Failed { output, .. } => output,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&BatchError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: usize,
}

impl RunSummary {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Skipped => self.skipped += 1,
            ItemStatus::DryRun => self.dry_run += 1,
            ItemStatus::Succeeded => self.succeeded += 1,
            ItemStatus::Failed => self.failed += 1,
        }
    }

    /// Number of items that reached a final state
    #[must_use]
    pub fn visited(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.dry_run
    }

    /// Every requested item has been accounted for exactly once
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.visited() == self.total
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, succeeded: {}, failed: {}, skipped: {}, dry run: {}",
            self.total, self.succeeded, self.failed, self.skipped, self.dry_run
        )
    }
}

/// One line of the JSON run report
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub index: usize,
    pub source: ImageSource,
    pub output: PathBuf,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemRecord {
    #[must_use]
    pub fn new(index: usize, source: &ImageSource, outcome: &ItemOutcome) -> Self {
        let bytes_written = match outcome {
            ItemOutcome::Succeeded { bytes_written, .. } => Some(*bytes_written),
            _ => None,
        };
        Self {
            index,
            source: source.clone(),
            output: outcome.output().to_path_buf(),
            status: outcome.status(),
            bytes_written,
            error_kind: outcome.error().map(BatchError::kind),
            error: outcome.error().map(ToString::to_string),
        }
    }
}

/// Full record of a run: summary, per-item records and timestamps
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub items: Vec<ItemRecord>,
}

impl RunReport {
    /// Write the report as pretty JSON
    ///
    /// # Errors
    /// - `FileAccess` if the file cannot be written
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            let io_error = std::io::Error::new(std::io::ErrorKind::InvalidData, e);
            BatchError::file_io_error("serialize run report for", path_ref, &io_error)
        })?;

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| BatchError::file_io_error("create report directory", parent, &e))?;
        }

        std::fs::write(path_ref, json)
            .map_err(|e| BatchError::file_io_error("write run report", path_ref, &e))
    }
}

/// Human-readable byte size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS.get(unit_index).unwrap_or(&"B"))
    } else {
        format!("{:.1} {}", size, UNITS.get(unit_index).unwrap_or(&"B"))
    }
}
