//! `rembg` command-line backend
//!
//! Runs `rembg i [-m MODEL] INPUT OUTPUT` on scratch files. Requires the
//! `rembg` CLI (`pip install "rembg[cli]"`).

use crate::{
    error::{BatchError, Result},
    remover::BackgroundRemover,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Default program name looked up on `PATH`
pub const DEFAULT_REMBG_PROGRAM: &str = "rembg";

const INSTALL_HINT: &str = "Install with: pip install \"rembg[cli]\" or pass --rembg-bin";

/// Background remover backed by the `rembg` CLI
#[derive(Debug, Clone)]
pub struct RembgCommand {
    program: PathBuf,
    model: Option<String>,
}

impl Default for RembgCommand {
    fn default() -> Self {
        Self::new(DEFAULT_REMBG_PROGRAM)
    }
}

impl RembgCommand {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            model: None,
        }
    }

    /// Select a rembg model (`u2net`, `isnet-general-use`, ...)
    #[must_use]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command_args(&self, input: &std::path::Path, output: &std::path::Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec!["i".into()];
        if let Some(model) = &self.model {
            args.push("-m".into());
            args.push(model.into());
        }
        args.push(input.into());
        args.push(output.into());
        args
    }
}

#[async_trait]
impl BackgroundRemover for RembgCommand {
    fn name(&self) -> &str {
        "rembg"
    }

    async fn check_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                BatchError::setup_error_with_hint(
                    &self.program.display().to_string(),
                    &e.to_string(),
                    INSTALL_HINT,
                )
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BatchError::setup_error_with_hint(
                &self.program.display().to_string(),
                &format!("`--help` exited with {}", status),
                INSTALL_HINT,
            ))
        }
    }

    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()
            .map_err(|e| BatchError::transform(format!("Failed to create scratch directory: {}", e)))?;
        let input = scratch.path().join("input.png");
        let output = scratch.path().join("output.png");

        tokio::fs::write(&input, png)
            .await
            .map_err(|e| BatchError::transform(format!("Failed to stage rembg input: {}", e)))?;

        tracing::trace!(program = %self.program.display(), "Running rembg");
        let result = Command::new(&self.program)
            .args(self.command_args(&input, &output))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BatchError::transform_error_with_remover(self.name(), &e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(BatchError::transform_error_with_remover(
                self.name(),
                &format!("exited with {}: {}", result.status, last_line.trim()),
            ));
        }

        tokio::fs::read(&output).await.map_err(|e| {
            BatchError::transform_error_with_remover(
                self.name(),
                &format!("no output produced: {}", e),
            )
        })
    }
}
