//! Pixel fingerprints for duplicate detection.
//!
//! The fingerprint is a BLAKE3 digest over a canonical RGBA8 buffer, so two
//! files with the same pixels hash the same regardless of container or
//! metadata.

use blake3::Hasher as Blake3Hasher;
use image::DynamicImage;
use std::path::Path;

use crate::error::PipelineResult;

use super::decode::ImageDecoder;

/// Computes content fingerprints for images.
#[derive(Debug, Clone)]
pub struct Hasher {
    decoder: ImageDecoder,
}

impl Hasher {
    pub fn new(decoder: ImageDecoder) -> Self {
        Self { decoder }
    }

    /// Fingerprint of already-decoded pixels.
    pub fn fingerprint(image: &DynamicImage) -> String {
        let rgba = image.to_rgba8();
        let mut hasher = Blake3Hasher::new();
        hasher.update(&rgba.width().to_le_bytes());
        hasher.update(&rgba.height().to_le_bytes());
        hasher.update(rgba.as_raw());
        hasher.finalize().to_hex().to_string()
    }

    /// Decode `path` and fingerprint it.
    ///
    /// Oversized images are fingerprinted on their envelope thumbnail, so
    /// two copies of the same huge image still match.
    pub fn fingerprint_file(&self, path: &Path) -> PipelineResult<String> {
        let decoded = self.decoder.decode_or_thumbnail(path)?;
        Ok(Self::fingerprint(&decoded.image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]))
    }

    #[test]
    fn test_fingerprint_consistency() {
        let img = DynamicImage::ImageRgb8(gradient(32, 16));
        assert_eq!(Hasher::fingerprint(&img), Hasher::fingerprint(&img));
    }

    #[test]
    fn test_same_pixels_different_container() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(gradient(40, 30));
        let png = dir.path().join("a.png");
        let bmp = dir.path().join("a.bmp");
        img.save(&png).unwrap();
        img.save(&bmp).unwrap();

        let hasher = Hasher::new(ImageDecoder::new(LimitsConfig::default()));
        assert_eq!(
            hasher.fingerprint_file(&png).unwrap(),
            hasher.fingerprint_file(&bmp).unwrap()
        );
    }

    #[test]
    fn test_opaque_rgb_matches_opaque_rgba() {
        let rgb = gradient(8, 8);
        let rgba = RgbaImage::from_fn(8, 8, |x, y| {
            let p = rgb.get_pixel(x, y);
            Rgba([p[0], p[1], p[2], 255])
        });
        assert_eq!(
            Hasher::fingerprint(&DynamicImage::ImageRgb8(rgb)),
            Hasher::fingerprint(&DynamicImage::ImageRgba8(rgba))
        );
    }

    #[test]
    fn test_dimensions_are_part_of_fingerprint() {
        // Same byte count, different shape
        let wide = DynamicImage::new_rgb8(4, 2);
        let tall = DynamicImage::new_rgb8(2, 4);
        assert_ne!(Hasher::fingerprint(&wide), Hasher::fingerprint(&tall));
    }
}
