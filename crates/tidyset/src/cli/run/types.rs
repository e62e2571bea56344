//! CLI enum types for the run command: mode, letterbox size, padding.

use clap::ValueEnum;
use tidyset_core::config::PaddingColor;
use tidyset_core::RunMode;

/// What the run does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Copy (and optionally letterbox) into the output directory, then rename
    CopyOnly,
    /// As copy-only, plus an empty label file per image
    CopyAndText,
    /// Only create missing label files in the directory
    TextOnly,
    /// Remove pixel-identical duplicates in the directory
    CheckDuplicates,
    /// Only rename the images already in the directory
    RenameOnly,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::CopyOnly => RunMode::CopyOnly,
            Mode::CopyAndText => RunMode::CopyAndText,
            Mode::TextOnly => RunMode::TextOnly,
            Mode::CheckDuplicates => RunMode::CheckDuplicates,
            Mode::RenameOnly => RunMode::RenameOnly,
        }
    }
}

/// Letterbox canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Size {
    #[value(name = "512")]
    Small,
    #[value(name = "1024")]
    Large,
}

impl Size {
    pub fn pixels(self) -> u32 {
        match self {
            Size::Small => 512,
            Size::Large => 1024,
        }
    }
}

/// Letterbox fill color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Padding {
    White,
    Black,
    /// Keeps alpha; forces PNG output
    Transparent,
}

impl From<Padding> for PaddingColor {
    fn from(padding: Padding) -> Self {
        match padding {
            Padding::White => PaddingColor::White,
            Padding::Black => PaddingColor::Black,
            Padding::Transparent => PaddingColor::Transparent,
        }
    }
}
