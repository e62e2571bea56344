//! Image decoding with format detection and decompression limits.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Image decoder with configurable safety limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// True when the image went through the oversize thumbnail path
    pub degraded: bool,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Longest edge an oversized image is reduced to.
    pub fn oversize_envelope(&self) -> u32 {
        self.limits.oversize_envelope
    }

    /// Decode within the configured limits.
    ///
    /// Exceeding a limit yields [`PipelineError::ImageTooLarge`], distinct
    /// from a corrupt or unreadable file.
    pub fn decode(&self, path: &Path) -> PipelineResult<DecodedImage> {
        let (mut reader, format) = Self::open(path)?;

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.limits.max_image_dimension);
        limits.max_image_height = Some(self.limits.max_image_dimension);
        limits.max_alloc = Some(self.limits.max_alloc_mb.saturating_mul(1024 * 1024));
        reader.limits(limits);

        let image = reader.decode().map_err(|e| match e {
            ImageError::Limits(limit) => PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                message: limit.to_string(),
            },
            other => PipelineError::Decode {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;

        Ok(Self::finish(image, format, false))
    }

    /// Decode without limits and shrink the result to the oversize envelope.
    pub fn decode_thumbnail(&self, path: &Path) -> PipelineResult<DecodedImage> {
        let (mut reader, format) = Self::open(path)?;
        reader.no_limits();

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let envelope = self.limits.oversize_envelope;
        let (width, height) = image.dimensions();
        let image = if width > envelope || height > envelope {
            image.thumbnail(envelope, envelope)
        } else {
            image
        };

        Ok(Self::finish(image, format, true))
    }

    /// Decode, falling back to the thumbnail path for oversized images.
    pub fn decode_or_thumbnail(&self, path: &Path) -> PipelineResult<DecodedImage> {
        match self.decode(path) {
            Err(PipelineError::ImageTooLarge { message, .. }) => {
                tracing::warn!(
                    "Oversized image {:?} ({}), reducing to {}px envelope",
                    path,
                    message,
                    self.limits.oversize_envelope
                );
                self.decode_thumbnail(path)
            }
            other => other,
        }
    }

    fn open(path: &Path) -> PipelineResult<(ImageReader<BufReader<File>>, ImageFormat)> {
        let reader = ImageReader::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::SourceMissing(path.to_path_buf()),
            _ => PipelineError::io(path, e),
        })?;
        let reader = reader
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };
        Ok((reader, format))
    }

    fn finish(image: DynamicImage, format: ImageFormat, degraded: bool) -> DecodedImage {
        let (width, height) = image.dimensions();
        DecodedImage {
            image,
            format,
            width,
            height,
            degraded,
        }
    }
}
