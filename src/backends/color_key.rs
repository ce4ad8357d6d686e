//! Color-key backend
//!
//! Pure Rust fallback for studio shots on a flat backdrop: the top-left
//! pixel is taken as the background color and every pixel within
//! `threshold` of it on all three channels becomes transparent.

use crate::{
    error::{BatchError, Result},
    remover::BackgroundRemover,
    services::ImageIOService,
};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};

/// Default per-channel distance still treated as background
pub const DEFAULT_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy)]
pub struct ColorKeyRemover {
    threshold: u8,
}

impl Default for ColorKeyRemover {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ColorKeyRemover {
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Key out the background in place
    ///
    /// # Errors
    /// - `Transform` for an image without pixels
    pub fn key_out(&self, image: &mut RgbaImage) -> Result<()> {
        let Some(&background) = image.get_pixel_checked(0, 0) else {
            return Err(BatchError::transform_error_with_remover(
                self.name(),
                "image has no pixels",
            ));
        };

        for pixel in image.pixels_mut() {
            if self.is_background(*pixel, background) {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
        Ok(())
    }

    fn is_background(&self, pixel: Rgba<u8>, background: Rgba<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(background.0.iter())
            .take(3)
            .all(|(a, b)| a.abs_diff(*b) <= self.threshold)
    }
}

#[async_trait]
impl BackgroundRemover for ColorKeyRemover {
    fn name(&self) -> &str {
        "color-key"
    }

    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>> {
        let mut image = ImageIOService::load_removal_output(png, self.name())?;
        self.key_out(&mut image)?;
        ImageIOService::encode_png(&image)
    }
}
