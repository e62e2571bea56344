//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel transform workers
    pub parallel_workers: usize,

    /// Image extensions picked up by discovery (case-insensitive)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
            ],
        }
    }
}

/// Pipeline settings for backpressure, retries and progress polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max work items buffered ahead of the worker pool
    pub buffer_size: usize,

    /// Attempts for a copy that hits a permission error
    pub retry_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// How often a progress poller should sample the tracker
    pub progress_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            progress_interval_ms: 100,
        }
    }
}

/// Decompression safety limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image width or height accepted by a normal decode
    pub max_image_dimension: u32,

    /// Maximum decoder allocation in megabytes
    pub max_alloc_mb: u64,

    /// Longest edge of the thumbnail an oversized image is reduced to
    pub oversize_envelope: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 16384,
            max_alloc_mb: 512,
            oversize_envelope: 1024,
        }
    }
}

/// Canvas fill used around a letterboxed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingColor {
    White,
    #[default]
    Black,
    Transparent,
}

impl PaddingColor {
    /// RGBA value of the fill.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            PaddingColor::White => [255, 255, 255, 255],
            PaddingColor::Black => [0, 0, 0, 255],
            PaddingColor::Transparent => [0, 0, 0, 0],
        }
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, PaddingColor::Transparent)
    }
}

impl std::fmt::Display for PaddingColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaddingColor::White => write!(f, "white"),
            PaddingColor::Black => write!(f, "black"),
            PaddingColor::Transparent => write!(f, "transparent"),
        }
    }
}

/// Image transform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Square letterbox size (512 or 1024); `None` keeps the original geometry
    pub resize: Option<u32>,

    /// Fill color for the letterbox canvas
    pub padding: PaddingColor,

    /// Write every output as PNG
    pub save_as_png: bool,

    /// Quality used when the output is JPEG
    pub jpeg_quality: u8,
}

/// Letterbox sizes the transformer accepts.
pub const RESIZE_TARGETS: [u32; 2] = [512, 1024];

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            resize: None,
            padding: PaddingColor::Black,
            save_as_png: false,
            jpeg_quality: 95,
        }
    }
}

/// Output naming settings.
///
/// `numbering` and the three rule toggles are mutually exclusive; see
/// [`crate::pipeline::NamingPolicy::from_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Number outputs sequentially (1, 2, 3, ...)
    pub numbering: bool,

    /// First number tried by the allocator
    pub start_number: u64,

    pub use_prefix: bool,
    pub prefix: String,

    pub use_suffix: bool,
    pub suffix: String,

    /// Replace `replace_from` with `replace_to` in the stem
    pub use_replace: bool,
    pub replace_from: String,
    pub replace_to: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            numbering: true,
            start_number: 1,
            use_prefix: false,
            prefix: String::new(),
            use_suffix: false,
            suffix: String::new(),
            use_replace: false,
            replace_from: String::new(),
            replace_to: String::new(),
        }
    }
}

impl NamingConfig {
    /// Whether any rule-based edit is switched on.
    pub fn has_rules(&self) -> bool {
        self.use_prefix || self.use_suffix || self.use_replace
    }
}

/// Label (sidecar) file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Extension of the label file, without the dot
    pub extension: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
