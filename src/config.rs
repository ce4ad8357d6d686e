//! Configuration types for batch background removal

use crate::{
    error::{BatchError, Result},
    naming::NamingScheme,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output directory for remote sources
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Configuration for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory receiving the transparent PNGs
    pub output_dir: PathBuf,
    /// Perform acquisition, transformation and persistence (false = dry run)
    pub commit: bool,
    /// Skip items whose output already exists
    pub skip_existing: bool,
    /// Output naming scheme
    pub naming: NamingScheme,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            commit: false,
            skip_existing: false,
            naming: NamingScheme::DashNoBg,
        }
    }
}

impl BatchConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::new()
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        !self.commit
    }
}

/// Builder for `BatchConfig`
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BatchConfig::default(),
        }
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn commit(mut self, commit: bool) -> Self {
        self.config.commit = commit;
        self
    }

    #[must_use]
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.config.skip_existing = skip;
        self
    }

    #[must_use]
    pub fn naming(mut self, naming: NamingScheme) -> Self {
        self.config.naming = naming;
        self
    }

    /// Build the batch configuration
    ///
    /// # Errors
    ///
    /// Returns `BatchError::InvalidConfig` for:
    /// - An empty output directory path
    /// - A custom naming suffix that is empty or contains a path separator
    pub fn build(self) -> Result<BatchConfig> {
        if self.config.output_dir.as_os_str().is_empty() {
            return Err(BatchError::invalid_config("output directory must not be empty"));
        }

        if let NamingScheme::Custom(suffix) = &self.config.naming {
            if suffix.is_empty() {
                return Err(BatchError::invalid_config("naming suffix must not be empty"));
            }
            if suffix.contains('/') || suffix.contains('\\') {
                return Err(BatchError::invalid_config(format!(
                    "naming suffix '{}' must not contain path separators",
                    suffix
                )));
            }
        }

        Ok(self.config)
    }
}
