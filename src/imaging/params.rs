//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which plans a photo card) and the [`backend`](super::backend) (which does
//! the pixel work). The mock backend in tests records them as-is.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1-100, default 85), clamped on construction.
//! - [`Canvas`]: exact output size.
//! - [`ComposeParams`]: everything the compositor needs for one photo card.
//! - [`PngParams`]: template card encoding (zlib effort, palette reduction).

use super::calculations::ProcessingStrategy;
use crate::config::{CanvasConfig, PngCompression, PngConfig};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Output canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl From<CanvasConfig> for Canvas {
    fn from(c: CanvasConfig) -> Self {
        Self {
            width: c.width,
            height: c.height,
        }
    }
}

/// A photo card: optionally crop the source, fit it inside the canvas, center
/// it on an opaque background and encode as JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeParams {
    pub source: PathBuf,
    pub strategy: ProcessingStrategy,
    pub canvas: Canvas,
    /// RGB fill behind the photo.
    pub background: [u8; 3],
    pub quality: Quality,
    /// Attention-based crop anchor; otherwise the crop is centered.
    pub smart_crop: bool,
}

/// PNG encoding of a rendered template card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngParams {
    pub compression: PngCompression,
    /// Indexed output when the image has at most 256 distinct colours.
    pub palette: bool,
}

impl Default for PngParams {
    fn default() -> Self {
        Self {
            compression: PngCompression::Best,
            palette: true,
        }
    }
}

impl From<PngConfig> for PngParams {
    fn from(c: PngConfig) -> Self {
        Self {
            compression: c.compression,
            palette: c.palette,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn canvas_from_config() {
        let canvas = Canvas::from(CanvasConfig::default());
        assert_eq!(canvas, Canvas { width: 1200, height: 630 });
    }
}
