//! FreeType face provider
//!
//! Grayscale rasterization through freetype-rs. Face and glyph metrics
//! come straight from FreeType in 26.6 fixed point.

use freetype::face::LoadFlag;
use freetype::render_mode::RenderMode;
use freetype::Library;
use log::{info, warn};
use std::path::Path;
use std::rc::Rc;

use super::error::{GlyphCacheError, Result};
use super::face::{FaceError, FaceProvider, FixedLineMetrics, RasterizedGlyph};

/// FreeType font face
pub struct FtFace {
    face: freetype::Face,
    _library: Library,
    size_px: u32,
}

impl FtFace {
    /// Load a face from a font file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| GlyphCacheError::font_load(path, e))?;
        Self::from_bytes(data).map_err(|e| e.with_path(path))
    }

    /// Load a face from font data (first face of a collection)
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let library = Library::init().map_err(|e| {
            GlyphCacheError::font_load("", format!("FreeType initialization failed: {:?}", e))
        })?;

        // freetype-rs requires Rc<Vec<u8>>
        let face = library
            .new_memory_face(Rc::new(data), 0)
            .map_err(|e| GlyphCacheError::font_load("", format!("FreeType font loading failed: {:?}", e)))?;

        info!(
            "FreeType face loaded: {}",
            face.family_name().unwrap_or_else(|| "unknown".to_string())
        );

        Ok(Self {
            face,
            _library: library,
            size_px: 0,
        })
    }
}

impl FaceProvider for FtFace {
    fn set_pixel_size(&mut self, pixel_size: u32) -> std::result::Result<(), FaceError> {
        self.face
            .set_pixel_sizes(0, pixel_size)
            .map_err(|e| FaceError::PixelSize {
                size: pixel_size,
                reason: format!("{:?}", e),
            })?;
        self.size_px = pixel_size;
        Ok(())
    }

    fn line_metrics(&self) -> FixedLineMetrics {
        match self.face.size_metrics() {
            Some(m) => FixedLineMetrics {
                ascender: m.ascender as i64,
                descender: m.descender as i64,
                height: m.height as i64,
            },
            None => {
                warn!("FreeType: no size metrics, estimating from pixel size");
                let size = self.size_px as i64 * 64;
                FixedLineMetrics {
                    ascender: size * 4 / 5,
                    descender: -size / 5,
                    height: size,
                }
            }
        }
    }

    fn rasterize(&mut self, ch: char) -> std::result::Result<RasterizedGlyph, FaceError> {
        // get_char_index returns 0 if not found
        let glyph_index = self.face.get_char_index(ch as usize);
        if glyph_index.is_none() || glyph_index == Some(0) {
            return Err(FaceError::GlyphNotFound(ch));
        }

        self.face
            .load_char(ch as usize, LoadFlag::DEFAULT)
            .map_err(|e| FaceError::Render {
                character: ch,
                reason: format!("{:?}", e),
            })?;

        let glyph = self.face.glyph();
        let advance_fixed = glyph.advance().x as i64;
        let advance_only = RasterizedGlyph {
            advance_fixed,
            ..Default::default()
        };

        // Outline loaded but not renderable: keep the pen moving
        if let Err(e) = glyph.render_glyph(RenderMode::Normal) {
            warn!("FreeType: render failed for {:?}: {:?}", ch, e);
            return Ok(advance_only);
        }

        let bitmap = glyph.bitmap();
        let width = bitmap.width().max(0) as u32;
        let height = bitmap.rows().max(0) as u32;

        if width == 0 || height == 0 {
            // Empty glyph (e.g., space)
            return Ok(advance_only);
        }

        // Drop row padding
        let buffer = bitmap.buffer();
        let pitch = bitmap.pitch().unsigned_abs() as usize;
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height as usize {
            let row = y * pitch;
            let Some(src) = buffer.get(row..row + width as usize) else {
                warn!(
                    "FreeType: bitmap buffer for {:?} too short ({} bytes)",
                    ch,
                    buffer.len()
                );
                return Ok(advance_only);
            };
            data.extend_from_slice(src);
        }

        Ok(RasterizedGlyph {
            bitmap: data,
            width,
            height,
            bearing_x: glyph.bitmap_left(),
            bearing_top: glyph.bitmap_top(),
            advance_fixed,
        })
    }

    fn family_name(&self) -> Option<String> {
        self.face.family_name()
    }
}
