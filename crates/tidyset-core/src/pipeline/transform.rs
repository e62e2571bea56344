//! Per-file transform: straight copy, PNG conversion, or letterbox resize.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::{PaddingColor, TransformConfig};
use crate::error::{PipelineError, PipelineResult};

use super::decode::ImageDecoder;

/// What the transformer does to each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    /// Byte-for-byte copy, extension preserved
    Copy,
    /// Re-encode as PNG without touching geometry
    Convert,
    /// Fit into a `size`×`size` canvas, padding the remainder
    Letterbox { size: u32 },
}

/// Writes one output file per source, never modifying the source.
#[derive(Debug, Clone)]
pub struct ImageTransformer {
    mode: TransformMode,
    padding: PaddingColor,
    save_as_png: bool,
    jpeg_quality: u8,
    decoder: ImageDecoder,
}

impl ImageTransformer {
    pub fn new(config: &TransformConfig, decoder: ImageDecoder) -> Self {
        let mode = match (config.resize, config.save_as_png) {
            (Some(size), _) => TransformMode::Letterbox { size },
            (None, true) => TransformMode::Convert,
            (None, false) => TransformMode::Copy,
        };
        Self {
            mode,
            padding: config.padding,
            save_as_png: config.save_as_png,
            jpeg_quality: config.jpeg_quality,
            decoder,
        }
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// The path `process` will write for a given destination hint.
    pub fn output_path(&self, hint: &Path) -> PathBuf {
        match self.mode {
            TransformMode::Copy => hint.to_path_buf(),
            TransformMode::Convert => hint.with_extension("png"),
            TransformMode::Letterbox { .. } => {
                if self.save_as_png || self.padding.is_transparent() {
                    hint.with_extension("png")
                } else {
                    hint.to_path_buf()
                }
            }
        }
    }

    /// Transform `source` into a new file derived from `dest_hint`.
    ///
    /// Returns the path actually written, whose extension may differ from
    /// the hint.
    pub fn process(&self, source: &Path, dest_hint: &Path) -> PipelineResult<PathBuf> {
        let dest = self.output_path(dest_hint);
        if dest == source {
            return Err(PipelineError::io(
                source,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "destination would overwrite the source file",
                ),
            ));
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }

        match self.mode {
            TransformMode::Copy => {
                std::fs::copy(source, &dest).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        PipelineError::SourceMissing(source.to_path_buf())
                    }
                    _ => PipelineError::io(source, e),
                })?;
            }
            TransformMode::Convert => {
                let decoded = self.decoder.decode_or_thumbnail(source)?;
                let image = if decoded.image.color().has_alpha() || self.padding.is_transparent()
                {
                    decoded.image
                } else {
                    DynamicImage::ImageRgb8(decoded.image.to_rgb8())
                };
                self.encode(&image, &dest)?;
            }
            TransformMode::Letterbox { size } => {
                let decoded = self.decoder.decode_or_thumbnail(source)?;
                let canvas = letterbox(&decoded.image, size, self.padding);
                self.encode(&canvas, &dest)?;
            }
        }

        tracing::debug!("Wrote {:?} -> {:?}", source, dest);
        Ok(dest)
    }

    fn encode(&self, image: &DynamicImage, dest: &Path) -> PipelineResult<()> {
        let format = ImageFormat::from_path(dest).map_err(|_| PipelineError::UnsupportedFormat {
            path: dest.to_path_buf(),
            format: dest
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;
        let encode_err = |e: image::ImageError| PipelineError::Encode {
            path: dest.to_path_buf(),
            message: e.to_string(),
        };

        match format {
            ImageFormat::Jpeg => {
                let file = File::create(dest).map_err(|e| PipelineError::io(dest, e))?;
                let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), self.jpeg_quality);
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(encode_err)
            }
            ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
                .save_with_format(dest, format)
                .map_err(encode_err),
            _ => image.save_with_format(dest, format).map_err(encode_err),
        }
    }
}

/// Scale `image` to fit a `size`×`size` square and center it on a padded canvas.
///
/// Alpha is composited over the fill color unless the fill is transparent,
/// in which case the result keeps its alpha channel.
pub fn letterbox(image: &DynamicImage, size: u32, padding: PaddingColor) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_within(width, height, size);

    let resized = imageops::resize(&image.to_rgba8(), new_width, new_height, FilterType::Lanczos3);
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba(padding.rgba()));
    let x = i64::from((size - new_width) / 2);
    let y = i64::from((size - new_height) / 2);

    if padding.is_transparent() {
        imageops::replace(&mut canvas, &resized, x, y);
        DynamicImage::ImageRgba8(canvas)
    } else {
        imageops::overlay(&mut canvas, &resized, x, y);
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}

/// Dimensions of a `width`×`height` image scaled so its longer side is `size`.
fn fit_within(width: u32, height: u32, size: u32) -> (u32, u32) {
    let (width, height) = (width.max(1) as f64, height.max(1) as f64);
    let scaled = |long: f64, short: f64| ((size as f64 * short / long) as u32).clamp(1, size);
    if width > height {
        (size, scaled(width, height))
    } else {
        (scaled(height, width), size)
    }
}
