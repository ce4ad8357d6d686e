//! Command-line entry points
//!
//! This module is only available when the "cli" feature is enabled.

mod common;
pub mod dir;
pub mod urls;

pub use common::{
    create_cli_progress_reporter, run_batch, CliRemover, IndicatifProgressReporter, RemoverArgs,
};
pub use dir::{DirCli, DirRunConfig};
pub use urls::UrlsCli;
