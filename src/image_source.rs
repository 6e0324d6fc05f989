use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;

/// An image decoded from disk and resized for display.
#[derive(Debug, Clone)]
pub struct ScaledImage {
    /// native (width, height)
    pub source_size: [u32; 2],
    /// displayed (width, height)
    pub size: [usize; 2],
    /// RGBA8, unmultiplied, row major
    pub pixels: Vec<u8>,
}

impl ScaledImage {
    pub fn width(&self) -> usize {
        self.size[0]
    }

    pub fn height(&self) -> usize {
        self.size[1]
    }
}

pub trait ImageSource {
    fn load(&mut self, path: &Path, scale: f64) -> Result<ScaledImage>;
}

pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).round().max(1.) as u32;
    let h = (height as f64 * scale).round().max(1.) as u32;
    (w, h)
}

/// Decodes with `image`, resamples with Lanczos3.
pub struct FileImageSource {
    resizer: Resizer,
}

impl Default for FileImageSource {
    fn default() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }
}

impl FileImageSource {
    fn resize(&mut self, img: DynamicImage, w: u32, h: u32) -> Result<DynamicImage> {
        if (img.width(), img.height()) == (w, h) {
            return Ok(img);
        }

        /// resizer works on the source's pixel layout, normalize to RGBA8 first
        let src = DynamicImage::ImageRgba8(img.to_rgba8());
        let mut dst = DynamicImage::new(w, h, src.color());

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

        self.resizer
            .resize(&src, &mut dst, &options)
            .context("Failed to resize image")?;

        Ok(dst)
    }
}

impl ImageSource for FileImageSource {
    fn load(&mut self, path: &Path, scale: f64) -> Result<ScaledImage> {
        ensure!(scale.is_finite() && scale > 0., "Invalid scale: {}", scale);

        let img = image::open(path)
            .with_context(|| format!("Failed to decode image: {}", path.display()))?;

        let source_size = [img.width(), img.height()];
        let (w, h) = scaled_dimensions(img.width(), img.height(), scale);

        trace!(
            "resizing {}: {}x{} -> {}x{}",
            path.display(),
            source_size[0],
            source_size[1],
            w,
            h
        );

        let scaled = self.resize(img, w, h)?;

        Ok(ScaledImage {
            source_size,
            size: [w as usize, h as usize],
            pixels: scaled.to_rgba8().into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(name: &str, w: u32, h: u32) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 10) as u8, 128])
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn scaled_dimensions_round_to_nearest() {
        assert_eq!(scaled_dimensions(10, 7, 1.0), (10, 7));
        assert_eq!(scaled_dimensions(10, 7, 2.0), (20, 14));
        assert_eq!(scaled_dimensions(5, 3, 1.5), (8, 5));
        assert_eq!(scaled_dimensions(3, 3, 0.1), (1, 1));
    }

    #[test]
    fn load_scales_png() {
        let path = write_test_png("point_labeler_load_scales.png", 12, 8);

        let mut source = FileImageSource::default();
        let img = source.load(&path, 2.0).unwrap();

        assert_eq!(img.source_size, [12, 8]);
        assert_eq!(img.size, [24, 16]);
        assert_eq!(img.pixels.len(), 24 * 16 * 4);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_at_unit_scale_keeps_pixels() {
        let path = write_test_png("point_labeler_unit_scale.png", 4, 4);

        let mut source = FileImageSource::default();
        let img = source.load(&path, 1.0).unwrap();

        assert_eq!(img.size, [4, 4]);
        /// pixel (1, 2)
        let i = (2 * 4 + 1) * 4;
        assert_eq!(&img.pixels[i..i + 4], &[10, 20, 128, 255]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut source = FileImageSource::default();
        let path = std::env::temp_dir().join("point_labeler_missing_image.png");
        let _ = std::fs::remove_file(&path);
        assert!(source.load(&path, 1.0).is_err());
    }

    #[test]
    fn non_image_file_is_an_error() {
        let path = std::env::temp_dir().join("point_labeler_not_an_image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut source = FileImageSource::default();
        assert!(source.load(&path, 1.0).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
