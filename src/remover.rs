//! Background remover abstraction

use crate::error::Result;
use async_trait::async_trait;

/// Trait for background removal backends
///
/// Removers receive a PNG with an alpha channel and return an encoded image
/// whose background has been made transparent.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Verify the remover can run at all (binary installed, API key present)
    ///
    /// # Errors
    /// - `Setup` when a required dependency is missing
    async fn check_available(&self) -> Result<()>;

    /// Remove the background from a PNG-encoded image
    ///
    /// # Errors
    /// - `Transform` for any failure of the removal itself
    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>>;
}

#[async_trait]
impl<R: BackgroundRemover + ?Sized> BackgroundRemover for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn check_available(&self) -> Result<()> {
        (**self).check_available().await
    }

    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>> {
        (**self).remove(png).await
    }
}
