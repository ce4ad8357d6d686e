//! Error types for batch background removal

use serde::Serialize;
use thiserror::Error;

/// Result type alias for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors raised while acquiring, transforming or persisting images
#[derive(Error, Debug)]
pub enum BatchError {
    /// Remote fetch failed (bad status, connection error)
    #[error("Network error: {0}")]
    Network(String),

    /// Local source missing or unreadable, or output path unwritable
    #[error("File access error: {0}")]
    FileAccess(#[from] std::io::Error),

    /// Source bytes could not be decoded as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Background removal failed or returned unusable data
    #[error("Transform error: {0}")]
    Transform(String),

    /// A required external dependency is unavailable
    #[error("Setup error: {0}")]
    Setup(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of a [`BatchError`], used in outcomes and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    FileAccess,
    Decode,
    Transform,
    Setup,
    InvalidConfig,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::FileAccess => "file access",
            Self::Decode => "decode",
            Self::Transform => "transform",
            Self::Setup => "setup",
            Self::InvalidConfig => "invalid config",
        };
        f.write_str(name)
    }
}

impl BatchError {
    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new transform error
    pub fn transform<S: Into<String>>(msg: S) -> Self {
        Self::Transform(msg.into())
    }

    /// Create a new setup error
    pub fn setup<S: Into<String>>(msg: S) -> Self {
        Self::Setup(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create network error wrapping an underlying transport error
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.into(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::FileAccess(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create transform error naming the remover that failed
    pub fn transform_error_with_remover(remover: &str, details: &str) -> Self {
        Self::Transform(format!("remover '{}' failed: {}", remover, details))
    }

    /// Create setup error with installation hints
    pub fn setup_error_with_hint(dependency: &str, error: &str, hint: &str) -> Self {
        Self::Setup(format!(
            "{} is not available ({}). {}",
            dependency, error, hint
        ))
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::FileAccess(_) => ErrorKind::FileAccess,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Transform(_) => ErrorKind::Transform,
            Self::Setup(_) => ErrorKind::Setup,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Whether this error must abort the run instead of failing a single item
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Setup(_) | Self::InvalidConfig(_))
    }
}
