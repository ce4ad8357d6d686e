//! Local directory scanning for batch input

use crate::{
    error::{BatchError, Result},
    naming::NamingScheme,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default glob applied to file names
pub const DEFAULT_PATTERN: &str = "*.jpg";

/// Default marker for alternate product shots that are not processed
pub const DEFAULT_EXCLUDE: &str = "_alt";

/// Which files in a directory make up the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory to scan
    pub input_dir: PathBuf,
    /// Glob matched against the file name (not the full path)
    pub pattern: String,
    /// Files whose name contains this substring are left out
    pub exclude_substring: Option<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Leave out files that this scheme would have produced
    #[serde(skip)]
    pub exclude_outputs_of: Option<NamingScheme>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("images/products"),
            pattern: DEFAULT_PATTERN.to_string(),
            exclude_substring: Some(DEFAULT_EXCLUDE.to_string()),
            recursive: false,
            exclude_outputs_of: None,
        }
    }
}

/// Find the batch's input files, sorted for a stable processing order
///
/// # Errors
/// - `InvalidConfig` if the glob pattern does not parse
/// - `FileAccess` if the input directory is missing or unreadable
pub fn scan_directory(config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let pattern = glob::Pattern::new(&config.pattern).map_err(|e| {
        BatchError::invalid_config(format!("invalid pattern '{}': {}", config.pattern, e))
    })?;

    let dir = config.input_dir.as_path();
    if !dir.is_dir() {
        return Err(BatchError::file_io_error(
            "scan input directory",
            dir,
            &std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut files = Vec::new();

    if config.recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry.map_err(|e| {
                let io_error = std::io::Error::new(std::io::ErrorKind::Other, e.to_string());
                BatchError::file_io_error("walk input directory", dir, &io_error)
            })?;
            if entry.file_type().is_file() && is_selected(entry.path(), &pattern, config) {
                files.push(entry.path().to_path_buf());
            }
        }
    } else {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| BatchError::file_io_error("read input directory", dir, &e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| BatchError::file_io_error("read input directory", dir, &e))?;
            let path = entry.path();
            let is_file = entry
                .file_type()
                .map_err(|e| BatchError::file_io_error("stat", &path, &e))?
                .is_file();
            if is_file && is_selected(&path, &pattern, config) {
                files.push(path);
            }
        }
    }

    files.sort();
    log::debug!(
        "Scan of {} found {} file(s) matching '{}'",
        dir.display(),
        files.len(),
        config.pattern
    );
    Ok(files)
}

fn is_selected(path: &Path, pattern: &glob::Pattern, config: &ScanConfig) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if !pattern.matches(file_name) {
        return false;
    }

    if let Some(marker) = config.exclude_substring.as_deref() {
        if !marker.is_empty() && file_name.contains(marker) {
            return false;
        }
    }

    if let Some(scheme) = &config.exclude_outputs_of {
        if scheme.is_output_name(file_name) {
            return false;
        }
    }

    true
}
