//! Deterministic output naming
//!
//! The output file name is a pure function of the source's base name:
//! `<stem><suffix>.png`. Two sources sharing a stem resolve to the same
//! output path.

use crate::source::ImageSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stem used when a source has no usable base name
pub const FALLBACK_STEM: &str = "image";

/// Output file extension; only PNG carries the transparency we produce
pub const OUTPUT_EXTENSION: &str = "png";

/// Marker appended to the input stem
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingScheme {
    /// `<stem>-no-bg.png`, used for remote sources
    #[default]
    DashNoBg,
    /// `<stem>_nobg.png`, used for directory scans
    UnderscoreNoBg,
    /// `<stem><suffix>.png`
    Custom(String),
}

impl NamingScheme {
    #[must_use]
    pub fn suffix(&self) -> &str {
        match self {
            Self::DashNoBg => "-no-bg",
            Self::UnderscoreNoBg => "_nobg",
            Self::Custom(suffix) => suffix,
        }
    }

    /// Whether `file_name` looks like something this scheme produced
    #[must_use]
    pub fn is_output_name(&self, file_name: &str) -> bool {
        file_name
            .strip_suffix(OUTPUT_EXTENSION)
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|stem| stem.ends_with(self.suffix()))
    }
}

/// Strip the last extension from a file name
///
/// Dot-files without another dot (".hidden") keep their full name.
#[must_use]
pub fn stem_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => file_name.get(..idx).unwrap_or(file_name),
    }
}

/// Base name of a source, or [`FALLBACK_STEM`] when it has none
#[must_use]
pub fn source_file_name(source: &ImageSource) -> String {
    source
        .file_name()
        .filter(|name| !stem_of(name).is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// Output file name for a source under the given scheme
#[must_use]
pub fn output_file_name(source: &ImageSource, scheme: &NamingScheme) -> String {
    let file_name = source_file_name(source);
    format!("{}{}.{}", stem_of(&file_name), scheme.suffix(), OUTPUT_EXTENSION)
}

/// Destination path for a source inside `output_dir`
#[must_use]
pub fn output_path(source: &ImageSource, output_dir: &Path, scheme: &NamingScheme) -> PathBuf {
    output_dir.join(output_file_name(source, scheme))
}
