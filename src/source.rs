//! Image sources: remote URLs or local files

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A reference to one input image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "location", rename_all = "snake_case")]
pub enum ImageSource {
    /// Remote image fetched over HTTP(S)
    Url(String),
    /// Local image file
    Path(PathBuf),
}

impl ImageSource {
    pub fn url<S: Into<String>>(url: S) -> Self {
        Self::Url(url.into())
    }

    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        Self::Path(path.into())
    }

    /// Base file name of the source, ignoring URL query strings and fragments
    ///
    /// Returns `None` when the source has no usable base name (e.g. a bare host).
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Url(url) => url_file_name(url),
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty()),
        }
    }

    /// Human-readable reference used in progress lines
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

fn url_file_name(url: &str) -> Option<String> {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        return parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|segment| !segment.is_empty());
    }

    // Not a parseable absolute URL, fall back to the last path segment
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Split a comma-separated URL list into sources
///
/// Entries are trimmed; empty entries are dropped. Order is preserved.
#[must_use]
pub fn parse_url_list(list: &str) -> Vec<ImageSource> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ImageSource::url)
        .collect()
}
