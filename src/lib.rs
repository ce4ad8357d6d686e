#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

//! # Batch Background Removal
//!
//! Removes image backgrounds in batch. Each source, a URL or a local file,
//! is acquired, normalized to RGBA, passed through a background remover and
//! saved as a PNG with a deterministic name. Items that fail are reported and
//! the batch moves on.
//!
//! ## Features
//!
//! - **Two input modes**: explicit URL lists and glob-filtered directory scans
//! - **Pluggable removers**: the `rembg` CLI, the remove.bg API, or a built-in
//!   color keyer for flat backdrops
//! - **Idempotent reruns**: existing outputs are skipped
//! - **Dry runs**: preview what would be written without touching the disk
//! - **Atomic writes**: outputs appear fully written or not at all
//! - **CLI Integration**: `bgremove-urls` and `bgremove-dir` (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_batch::{
//!     BatchConfig, BatchProcessor, DefaultRemoverFactory, ImageSource, RemoverFactory,
//!     RemoverKind, RemoverSettings,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BatchConfig::builder()
//!     .output_dir("output")
//!     .commit(true)
//!     .skip_existing(true)
//!     .build()?;
//!
//! let settings = RemoverSettings {
//!     kind: RemoverKind::Rembg,
//!     ..RemoverSettings::default()
//! };
//! let remover = DefaultRemoverFactory.create_remover(&settings)?;
//!
//! let processor = BatchProcessor::new(config, remover)?;
//! processor.check_setup().await?;
//!
//! let summary = processor
//!     .run(&[ImageSource::url("https://example.com/shoe.jpg")])
//!     .await;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line entry points and tracing subscriber setup
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! bgremove-batch = { version = "0.1", default-features = false }
//! ```

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod naming;
pub mod processor;
pub mod remover;
pub mod scan;
pub mod services;
pub mod source;
pub mod tracing_config;
pub mod types;

pub use backends::{
    ColorKeyRemover, DefaultRemoverFactory, RembgCommand, RemoveBgApi, RemoverFactory,
    RemoverKind, RemoverSettings,
};
pub use config::{BatchConfig, BatchConfigBuilder};
pub use download::{ImageDownloader, SourceFetcher};
pub use error::{BatchError, ErrorKind, Result};
pub use naming::{output_file_name, output_path, source_file_name, NamingScheme};
pub use processor::BatchProcessor;
pub use remover::BackgroundRemover;
pub use scan::{scan_directory, ScanConfig};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProcessingStage,
    ProgressEvent, ProgressReporter, RecordingProgressReporter,
};
pub use source::{parse_url_list, ImageSource};
pub use types::{format_size, ItemOutcome, ItemRecord, ItemStatus, RunReport, RunSummary};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Scan a directory and process every selected file
///
/// The scan excludes files already named like this run's outputs, so an
/// output directory nested inside the input directory is never fed back in.
///
/// # Errors
///
/// - `InvalidConfig` for a bad glob pattern
/// - `FileAccess` if the input directory cannot be read
pub async fn process_directory(
    processor: &BatchProcessor,
    scan: &ScanConfig,
) -> Result<RunReport> {
    let mut scan = scan.clone();
    if scan.exclude_outputs_of.is_none() {
        scan.exclude_outputs_of = Some(processor.config().naming.clone());
    }

    let sources: Vec<ImageSource> = scan_directory(&scan)?
        .into_iter()
        .map(ImageSource::from)
        .collect();

    Ok(processor.run_with_report(&sources).await)
}
