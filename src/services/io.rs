//! Image I/O operations service
//!
//! Decoding, alpha normalization and crash-safe PNG persistence, kept apart
//! from the batch loop so each step can be tested on its own.

use crate::error::{BatchError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Write;
use std::path::Path;

const TEMP_PREFIX: &str = ".bgremove-";
const TEMP_SUFFIX: &str = ".png.tmp";

/// Service for handling image decode/encode and output writes
pub struct ImageIOService;

impl ImageIOService {
    /// Decode raw image bytes
    ///
    /// # Arguments
    /// * `bytes` - Encoded image data (PNG, JPEG, WebP, TIFF)
    /// * `origin` - Where the bytes came from, used in the error message
    ///
    /// # Errors
    /// - `Decode` when the bytes are empty or not a supported image
    pub fn load_from_bytes(bytes: &[u8], origin: &str) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(BatchError::decode(format!("{} is empty", origin)));
        }
        image::load_from_memory(bytes).map_err(|e| {
            BatchError::decode(format!(
                "Failed to decode image from {} ({} bytes): {}",
                origin,
                bytes.len(),
                e
            ))
        })
    }

    /// Ensure the image carries an alpha channel
    #[must_use]
    pub fn normalize(image: DynamicImage) -> RgbaImage {
        match image {
            DynamicImage::ImageRgba8(rgba) => rgba,
            other => other.to_rgba8(),
        }
    }

    /// Encode an RGBA image as PNG bytes
    ///
    /// # Errors
    /// - `Transform` if the PNG encoder rejects the image
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| BatchError::transform(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }

    /// Decode, add alpha and re-encode as PNG: the form handed to removers
    ///
    /// # Errors
    /// - `Decode` when the source bytes are not an image
    pub fn prepare_for_removal(bytes: &[u8], origin: &str) -> Result<Vec<u8>> {
        let image = Self::load_from_bytes(bytes, origin)?;
        let rgba = Self::normalize(image);
        log::trace!(
            "Normalized {} to RGBA {}x{}",
            origin,
            rgba.width(),
            rgba.height()
        );
        Self::encode_png(&rgba)
    }

    /// Decode a remover's output
    ///
    /// # Errors
    /// - `Transform` when the remover returned something that is not an image
    pub fn load_removal_output(bytes: &[u8], remover: &str) -> Result<RgbaImage> {
        Self::load_from_bytes(bytes, "remover output")
            .map(Self::normalize)
            .map_err(|e| BatchError::transform_error_with_remover(remover, &e.to_string()))
    }

    /// Write an RGBA image as PNG, replacing `path` atomically
    ///
    /// The PNG is written to a temporary file in the destination directory
    /// and renamed over `path`, so a reader never observes a partial file.
    /// Parent directories are created as needed.
    ///
    /// # Returns
    /// * `Ok(u64)` - Size of the written file in bytes
    ///
    /// # Errors
    /// - `FileAccess` if the directory cannot be created or the file written
    pub fn write_png_atomic<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<u64> {
        let path_ref = path.as_ref();
        let parent = match path_ref.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        std::fs::create_dir_all(parent)
            .map_err(|e| BatchError::file_io_error("create output directory", parent, &e))?;

        let bytes = Self::encode_png(image).map_err(|e| {
            let io_error = std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string());
            BatchError::file_io_error("encode output", path_ref, &io_error)
        })?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)
            .map_err(|e| BatchError::file_io_error("create temporary file in", parent, &e))?;

        temp.write_all(&bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| BatchError::file_io_error("write", temp.path(), &e))?;

        temp.persist(path_ref)
            .map_err(|e| BatchError::file_io_error("move output into place at", path_ref, &e.error))?;

        Ok(bytes.len() as u64)
    }

    /// Delete temporary files left in `dir` by an interrupted `write_png_atomic`
    ///
    /// Returns the number of files removed. A missing or unreadable
    /// directory removes nothing.
    pub fn remove_stale_temp_files<P: AsRef<Path>>(dir: P) -> usize {
        let Ok(entries) = std::fs::read_dir(dir.as_ref()) else {
            return 0;
        };

        entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
            })
            .filter(|entry| match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    log::debug!("Removed stale temporary file {}", entry.path().display());
                    true
                },
                Err(e) => {
                    log::warn!(
                        "Failed to remove stale temporary file {}: {}",
                        entry.path().display(),
                        e
                    );
                    false
                },
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};
    use tempfile::tempdir;

    fn encoded(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), format)
            .unwrap();
        buffer
    }

    #[test]
    fn test_load_from_bytes_invalid() {
        let err = ImageIOService::load_from_bytes(b"not an image", "test").unwrap_err();
        assert!(matches!(err, BatchError::Decode(_)));
    }

    #[test]
    fn test_load_from_bytes_empty() {
        let err = ImageIOService::load_from_bytes(&[], "download").unwrap_err();
        assert!(err.to_string().contains("download is empty"));
    }

    #[test]
    fn test_normalize_adds_alpha() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([10, 20, 30])));
        let rgba = ImageIOService::normalize(rgb);
        assert_eq!(rgba.dimensions(), (4, 3));
        assert_eq!(*rgba.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_prepare_for_removal_from_jpeg() {
        let jpeg = encoded(
            &DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]))),
            ImageFormat::Jpeg,
        );
        let png = ImageIOService::prepare_for_removal(&jpeg, "a.jpg").unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.width(), 8);
    }

    #[test]
    fn test_load_removal_output_rejects_garbage() {
        let err = ImageIOService::load_removal_output(b"garbage", "rembg").unwrap_err();
        assert!(matches!(err, BatchError::Transform(_)));
        assert!(err.to_string().contains("rembg"));
    }

    #[test]
    fn test_write_png_atomic_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/a-no-bg.png");
        let image = RgbaImage::from_pixel(5, 5, Rgba([1, 2, 3, 0]));

        let size = ImageIOService::write_png_atomic(&image, &path).unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), size);
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(*reloaded.get_pixel(2, 2), Rgba([1, 2, 3, 0]));
    }

    #[test]
    fn test_write_png_atomic_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a-no-bg.png");
        let image = RgbaImage::new(2, 2);

        ImageIOService::write_png_atomic(&image, &path).unwrap();
        ImageIOService::write_png_atomic(&image, &path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_remove_stale_temp_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".bgremove-Ab12Cd.png.tmp"), b"partial").unwrap();
        std::fs::write(dir.path().join(".bgremove-Zz99Yy.png.tmp"), b"partial").unwrap();
        std::fs::write(dir.path().join("a_nobg.png"), b"done").unwrap();
        std::fs::write(dir.path().join("notes.tmp"), b"keep").unwrap();

        assert_eq!(ImageIOService::remove_stale_temp_files(dir.path()), 2);

        let mut left: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        left.sort();
        assert_eq!(left, vec!["a_nobg.png", "notes.tmp"]);
        assert_eq!(ImageIOService::remove_stale_temp_files(dir.path().join("absent")), 0);
    }

    #[test]
    fn test_write_png_atomic_unwritable_target() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not dir").unwrap();
        let path = blocker.join("a.png");

        let err = ImageIOService::write_png_atomic(&RgbaImage::new(1, 1), &path).unwrap_err();
        assert!(matches!(err, BatchError::FileAccess(_)));
    }
}
