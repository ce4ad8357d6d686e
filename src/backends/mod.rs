//! Background remover implementations
//!
//! - `rembg` CLI backend (local ML segmentation, default)
//! - remove.bg HTTP API backend (hosted, needs an API key)
//! - color-key backend (pure Rust, flat backdrops only)

pub mod color_key;
pub mod rembg;
pub mod remove_bg;

pub use self::color_key::ColorKeyRemover;
pub use self::rembg::RembgCommand;
pub use self::remove_bg::RemoveBgApi;

use crate::{error::Result, remover::BackgroundRemover};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Remover selection for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoverKind {
    /// `rembg` command-line tool
    #[default]
    Rembg,
    /// remove.bg hosted API
    RemoveBg,
    /// Built-in flat backdrop keyer
    ColorKey,
}

impl std::fmt::Display for RemoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rembg => write!(f, "rembg"),
            Self::RemoveBg => write!(f, "remove-bg"),
            Self::ColorKey => write!(f, "color-key"),
        }
    }
}

/// Settings needed to construct any remover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoverSettings {
    pub kind: RemoverKind,
    /// Path or name of the rembg executable
    pub rembg_program: PathBuf,
    /// Optional rembg model name
    pub rembg_model: Option<String>,
    /// remove.bg API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// remove.bg endpoint
    pub api_endpoint: String,
    /// Minimum spacing between remove.bg requests, in milliseconds
    pub api_min_interval_ms: u64,
    /// Color-key threshold
    pub color_threshold: u8,
}

impl Default for RemoverSettings {
    fn default() -> Self {
        Self {
            kind: RemoverKind::default(),
            rembg_program: PathBuf::from(rembg::DEFAULT_REMBG_PROGRAM),
            rembg_model: None,
            api_key: None,
            api_endpoint: remove_bg::DEFAULT_REMOVE_BG_ENDPOINT.to_string(),
            api_min_interval_ms: remove_bg::DEFAULT_MIN_INTERVAL.as_millis() as u64,
            color_threshold: color_key::DEFAULT_THRESHOLD,
        }
    }
}

/// Factory trait for creating removers
pub trait RemoverFactory: Send + Sync {
    /// Create a remover of the configured kind
    ///
    /// # Errors
    ///
    /// Returns `BatchError` when the remover cannot be constructed
    fn create_remover(&self, settings: &RemoverSettings) -> Result<Box<dyn BackgroundRemover>>;

    /// List remover kinds this factory can build
    fn available_kinds(&self) -> Vec<RemoverKind>;
}

/// Default remover factory implementation
pub struct DefaultRemoverFactory;

impl RemoverFactory for DefaultRemoverFactory {
    fn create_remover(&self, settings: &RemoverSettings) -> Result<Box<dyn BackgroundRemover>> {
        match settings.kind {
            RemoverKind::Rembg => {
                let mut command = RembgCommand::new(settings.rembg_program.clone());
                if let Some(model) = &settings.rembg_model {
                    command = command.with_model(model.clone());
                }
                Ok(Box::new(command))
            },
            RemoverKind::RemoveBg => {
                let api = RemoveBgApi::new(settings.api_key.clone())?
                    .with_endpoint(settings.api_endpoint.clone())
                    .with_min_interval(Duration::from_millis(settings.api_min_interval_ms));
                Ok(Box::new(api))
            },
            RemoverKind::ColorKey => Ok(Box::new(ColorKeyRemover::new(settings.color_threshold))),
        }
    }

    fn available_kinds(&self) -> Vec<RemoverKind> {
        vec![RemoverKind::Rembg, RemoverKind::RemoveBg, RemoverKind::ColorKey]
    }
}
