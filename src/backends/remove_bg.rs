//! remove.bg HTTP API backend

use crate::{
    error::{BatchError, Result},
    remover::BackgroundRemover,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Public remove.bg endpoint
pub const DEFAULT_REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// Spacing between requests that keeps the free tier under its rate limit
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Background remover backed by the remove.bg API
///
/// Consecutive `remove` calls are spaced at least `min_interval` apart.
/// Clones share the same spacing.
#[derive(Debug, Clone)]
pub struct RemoveBgApi {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RemoveBgApi {
    /// Create a client for the public endpoint
    ///
    /// # Errors
    /// - `Setup` if the HTTP client cannot be built
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| BatchError::setup(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: DEFAULT_REMOVE_BG_ENDPOINT.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            min_interval: DEFAULT_MIN_INTERVAL,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    #[must_use]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Minimum time between the start of two requests; zero disables spacing
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    async fn wait_for_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Waiting before next remove.bg request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            BatchError::setup_error_with_hint(
                "remove.bg API key",
                &format!("{} not set", API_KEY_ENV),
                "Get a key at https://remove.bg/api or use the rembg remover",
            )
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgApi {
    fn name(&self) -> &str {
        "remove.bg"
    }

    async fn check_available(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>> {
        let api_key = self
            .api_key()
            .map_err(|e| BatchError::transform_error_with_remover(self.name(), &e.to_string()))?;

        let part = Part::bytes(png.to_vec())
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| BatchError::transform_error_with_remover(self.name(), &e.to_string()))?;
        let form = Form::new().part("image_file", part).text("size", "auto");

        self.wait_for_turn().await;

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BatchError::transform_error_with_remover(self.name(), &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BatchError::transform_error_with_remover(
                self.name(),
                &format!("HTTP {}: {}", status, body.trim()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BatchError::transform_error_with_remover(self.name(), &e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
