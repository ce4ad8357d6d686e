//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bgremove_batch::{
    error::{BatchError, Result},
    BackgroundRemover, ImageSource, SourceFetcher,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Encode a product shot: light flat backdrop with a dark square in the middle
pub fn product_shot_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut image = RgbImage::from_pixel(width, height, Rgb([245, 245, 245]));
    for y in height / 4..height * 3 / 4 {
        for x in width / 4..width * 3 / 4 {
            image.put_pixel(x, y, Rgb([30, 40, 50]));
        }
    }

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buffer), format)
        .expect("encode test image");
    buffer
}

/// Write a product shot as JPEG
pub fn write_product_jpeg(path: &Path) {
    std::fs::write(path, product_shot_bytes(16, 16, ImageFormat::Jpeg)).expect("write test jpeg");
}

/// Load a written PNG as RGBA
pub fn load_rgba(path: &Path) -> RgbaImage {
    image::open(path).expect("open output").to_rgba8()
}

/// Remover that counts calls and fails on the given (1-based) call numbers
pub struct ScriptedRemover {
    calls: Arc<AtomicUsize>,
    fail_on: Vec<usize>,
}

impl ScriptedRemover {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            fail_on: Vec::new(),
        }
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.to_vec();
        self
    }
}

#[async_trait]
impl BackgroundRemover for ScriptedRemover {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, png: &[u8]) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(BatchError::transform(format!("scripted failure on call {}", call)));
        }

        // Make every pixel half transparent so tests can tell the output was transformed
        let mut image = image::load_from_memory(png)
            .map_err(|e| BatchError::transform(e.to_string()))?
            .to_rgba8();
        for pixel in image.pixels_mut() {
            *pixel = Rgba([pixel[0], pixel[1], pixel[2], 128]);
        }
        bgremove_batch::ImageIOService::encode_png(&image)
    }
}

/// Fetcher that counts calls and delegates to the filesystem
pub struct CountingFetcher {
    calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl SourceFetcher for CountingFetcher {
    async fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match source {
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| BatchError::file_io_error("read source", path, &e)),
            ImageSource::Url(url) => Err(BatchError::network(format!("offline: {}", url))),
        }
    }
}
