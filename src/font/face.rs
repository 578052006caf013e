//! Face provider contract
//!
//! The glyph cache never talks to a font library directly. A provider
//! loads one face, is told the pixel size once, and then hands out
//! grayscale bitmaps plus 26.6 fixed-point metrics per character.

use thiserror::Error;

/// Face-level vertical metrics in 26.6 fixed point, valid after `set_pixel_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedLineMetrics {
    /// Distance from baseline to the top of the face (positive)
    pub ascender: i64,
    /// Distance from baseline to the bottom of the face (negative)
    pub descender: i64,
    /// Recommended baseline-to-baseline distance
    pub height: i64,
}

/// Rasterization result for one character
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RasterizedGlyph {
    /// Coverage bytes, row-major, `width * height` long, no row padding
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Pen origin to the left edge of the bitmap (pixels)
    pub bearing_x: i32,
    /// Baseline to the top edge of the bitmap, positive upward (pixels)
    pub bearing_top: i32,
    /// Horizontal advance (26.6 fixed point)
    pub advance_fixed: i64,
}

impl RasterizedGlyph {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Error)]
pub enum FaceError {
    /// The face has no glyph for this code point
    #[error("glyph not found: {0:?}")]
    GlyphNotFound(char),
    /// The library failed to load or render the glyph
    #[error("failed to render {character:?}: {reason}")]
    Render { character: char, reason: String },
    #[error("failed to set pixel size {size}: {reason}")]
    PixelSize { size: u32, reason: String },
}

/// A loaded font face at a configurable pixel size
pub trait FaceProvider {
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<(), FaceError>;

    fn line_metrics(&self) -> FixedLineMetrics;

    fn rasterize(&mut self, ch: char) -> Result<RasterizedGlyph, FaceError>;

    fn family_name(&self) -> Option<String> {
        None
    }
}

impl<F: FaceProvider + ?Sized> FaceProvider for Box<F> {
    fn set_pixel_size(&mut self, pixel_size: u32) -> Result<(), FaceError> {
        (**self).set_pixel_size(pixel_size)
    }

    fn line_metrics(&self) -> FixedLineMetrics {
        (**self).line_metrics()
    }

    fn rasterize(&mut self, ch: char) -> Result<RasterizedGlyph, FaceError> {
        (**self).rasterize(ch)
    }

    fn family_name(&self) -> Option<String> {
        (**self).family_name()
    }
}
