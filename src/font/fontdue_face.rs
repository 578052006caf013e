//! fontdue face provider
//!
//! fontdue reports float pixel metrics; they are converted to 26.6 so
//! both providers feed the cache the same fixed-point contract.

use fontdue::{Font, FontSettings};
use log::info;
use std::path::Path;

use super::error::{GlyphCacheError, Result};
use super::face::{FaceError, FaceProvider, FixedLineMetrics, RasterizedGlyph};
use super::metrics::px_to_fixed;

/// fontdue font face
pub struct FontdueFace {
    font: Font,
    size_px: f32,
}

impl FontdueFace {
    /// Load a face from a font file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| GlyphCacheError::font_load(path, e))?;
        Self::from_bytes(&data).map_err(|e| e.with_path(path))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| GlyphCacheError::font_load("", format!("Failed to load font: {}", e)))?;

        info!("fontdue face loaded ({} bytes)", data.len());

        Ok(Self { font, size_px: 0.0 })
    }
}

impl FaceProvider for FontdueFace {
    fn set_pixel_size(&mut self, pixel_size: u32) -> std::result::Result<(), FaceError> {
        if pixel_size == 0 {
            return Err(FaceError::PixelSize {
                size: pixel_size,
                reason: "pixel size must be positive".to_string(),
            });
        }
        self.size_px = pixel_size as f32;
        Ok(())
    }

    fn line_metrics(&self) -> FixedLineMetrics {
        match self.font.horizontal_line_metrics(self.size_px) {
            Some(m) => FixedLineMetrics {
                ascender: px_to_fixed(m.ascent),
                descender: px_to_fixed(m.descent),
                height: px_to_fixed(m.new_line_size),
            },
            None => {
                let size = px_to_fixed(self.size_px);
                FixedLineMetrics {
                    ascender: size * 4 / 5,
                    descender: -size / 5,
                    height: size,
                }
            }
        }
    }

    fn rasterize(&mut self, ch: char) -> std::result::Result<RasterizedGlyph, FaceError> {
        if self.font.lookup_glyph_index(ch) == 0 {
            return Err(FaceError::GlyphNotFound(ch));
        }

        let (metrics, bitmap) = self.font.rasterize(ch, self.size_px);
        let advance_fixed = px_to_fixed(metrics.advance_width);

        if metrics.width == 0 || metrics.height == 0 {
            return Ok(RasterizedGlyph {
                advance_fixed,
                ..Default::default()
            });
        }

        Ok(RasterizedGlyph {
            bitmap,
            width: metrics.width as u32,
            height: metrics.height as u32,
            bearing_x: metrics.xmin,
            // ymin is the bitmap bottom relative to the baseline
            bearing_top: metrics.ymin + metrics.height as i32,
            advance_fixed,
        })
    }
}
