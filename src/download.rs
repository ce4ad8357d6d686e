//! Source acquisition: HTTP downloads and local file reads
//!
//! Remote images are fetched with a shared `reqwest` client; local files are
//! read with `tokio::fs`. Both return the raw encoded bytes.

use crate::error::{BatchError, Result};
use crate::source::ImageSource;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// User agent sent with image downloads
const USER_AGENT: &str = concat!("bgremove-batch/", env!("CARGO_PKG_VERSION"));

/// Connection timeout for image downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Obtains the raw bytes behind an [`ImageSource`]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the encoded image bytes
    ///
    /// # Errors
    /// - `Network` for connection failures and non-2xx responses
    /// - `FileAccess` for missing or unreadable local files
    async fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>>;
}

/// Default fetcher: HTTP(S) for URLs, filesystem for paths
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
}

impl ImageDownloader {
    /// Create a new image downloader
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BatchError::setup(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Use an existing client (shared connection pool, custom proxy settings)
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download a single URL into memory
    ///
    /// # Errors
    /// - `Network` if the request fails, the status is not 2xx, or the body cannot be read
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("Downloading: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BatchError::network_error(format!("Failed to download {}", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::network(format!(
                "HTTP error {} for {}",
                status, url
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            BatchError::network_error(format!("Failed to read response body from {}", url), e)
        })?;

        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Read a local image file
    ///
    /// # Errors
    /// - `FileAccess` if the file is missing or unreadable
    pub async fn read_file(path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| BatchError::file_io_error("read image file", path, &e))
    }
}

#[async_trait]
impl SourceFetcher for ImageDownloader {
    async fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>> {
        match source {
            ImageSource::Url(url) => self.download(url).await,
            ImageSource::Path(path) => Self::read_file(path).await,
        }
    }
}
