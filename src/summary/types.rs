//! Public types for the summary image module.

use crate::error::AppError;
use std::path::Path;
use std::str::FromStr;

/// Output encodings supported by the summary renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Raster image (default).
    #[default]
    Png,
    /// Vector image.
    Svg,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Infer from a file extension; anything but `.svg` renders PNG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageFormat::Svg,
            _ => ImageFormat::Png,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(AppError::validation(format!(
                "invalid image format '{other}', expected png or svg"
            ))),
        }
    }
}

/// Default canvas size.
pub const DEFAULT_SIZE: (u32, u32) = (800, 600);

/// How many countries the GDP ranking lists.
pub const TOP_GDP_COUNT: usize = 5;
