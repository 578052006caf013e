//! Text layout
//!
//! Turns a string into positioned glyph quads. Lines are split on '\n'
//! and stacked by the face line height; the pen moves by each glyph's
//! advance. Quad positions are in pixels with y growing downward from
//! the top of the text block.

use crate::font::error::Result;
use crate::font::face::FaceProvider;
use crate::font::{GlyphAtlasCache, GlyphCache};

/// Alignment along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

impl Align {
    fn offset(self, available: i32, used: i32) -> i32 {
        match self {
            Self::Start => 0,
            Self::Center => (available - used) / 2,
            Self::End => available - used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub horizontal: Align,
    pub vertical: Align,
    /// Box to align within (width, height); the text block itself if `None`
    pub bounds: Option<(i32, i32)>,
}

/// One drawable glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub character: char,
    /// Top-left of the bitmap
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// `[u_min, v_min, u_max, v_max]` in the atlas of `TextLayout::atlas_side`
    pub uv: [f32; 4],
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub quads: Vec<GlyphQuad>,
    /// Widest line (pixels)
    pub width: i32,
    /// `line_count * line_height`
    pub height: i32,
    pub line_count: usize,
    /// Atlas side the UVs were computed against
    pub atlas_side: u32,
    pub atlas_generation: u64,
}

/// Lay out `text` with glyphs from `cache`, rasterizing misses first
pub fn layout_text<F: FaceProvider>(
    cache: &mut GlyphCache<F>,
    text: &str,
    options: &LayoutOptions,
) -> Result<TextLayout> {
    // Resolve everything up front so no growth happens mid-layout
    cache.preload(text)?;
    let cache = &*cache;

    let metrics = cache.metrics();
    let side = cache.side_length();

    let mut quads = Vec::new();
    // (first quad index, line width)
    let mut lines: Vec<(usize, i32)> = Vec::new();

    for (line_idx, line) in text.split('\n').enumerate() {
        let start = quads.len();
        let line_top = line_idx as i32 * metrics.line_height;
        let mut pen = 0i32;

        for ch in line.chars() {
            let Some(record) = cache.glyph(ch) else {
                continue;
            };
            if !record.is_empty() {
                quads.push(GlyphQuad {
                    character: ch,
                    x: pen + record.bearing_x,
                    y: line_top + record.bearing_y,
                    width: record.width,
                    height: record.height,
                    uv: record.uv_rect(side),
                    line: line_idx,
                });
            }
            pen += record.advance;
        }

        lines.push((start, pen));
    }

    let line_count = lines.len();
    let width = lines.iter().map(|&(_, w)| w).max().unwrap_or(0);
    let height = line_count as i32 * metrics.line_height;
    let (avail_w, avail_h) = options.bounds.unwrap_or((width, height));

    let dy = options.vertical.offset(avail_h, height);
    for (i, &(start, line_width)) in lines.iter().enumerate() {
        let end = lines.get(i + 1).map(|&(s, _)| s).unwrap_or(quads.len());
        let dx = options.horizontal.offset(avail_w, line_width);
        for quad in &mut quads[start..end] {
            quad.x += dx;
            quad.y += dy;
        }
    }

    Ok(TextLayout {
        quads,
        width,
        height,
        line_count,
        atlas_side: side,
        atlas_generation: cache.generation(),
    })
}

impl GlyphAtlasCache {
    /// Lay out `text`; the generation matches `atlas_snapshot()`
    pub fn layout(&mut self, text: &str, options: &LayoutOptions) -> Result<TextLayout> {
        let mut layout = layout_text(self.cache_mut(), text, options)?;
        layout.atlas_generation = self.generation();
        Ok(layout)
    }
}
