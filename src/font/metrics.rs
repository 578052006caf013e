//! Face metrics in whole pixels
//!
//! Providers report 26.6 fixed point. Everything the cache stores is
//! truncated to integer pixels once, here, so every glyph of a face
//! shares the same ascender-relative vertical convention.

use super::face::FixedLineMetrics;

/// 26.6 fixed point to whole pixels (floor, like `>> 6`)
pub fn fixed_to_px(value: i64) -> i32 {
    (value >> 6) as i32
}

/// Whole or fractional pixels to 26.6 fixed point
pub fn px_to_fixed(px: f32) -> i64 {
    (px * 64.0).round() as i64
}

/// Vertical metrics of one face at one pixel size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceMetrics {
    pub pixel_size: u32,
    /// Baseline to top of the face, pixels above the baseline
    pub ascender: i32,
    /// Baseline to bottom of the face, negative below the baseline
    pub descender: i32,
    /// Distance between successive line tops
    pub line_height: i32,
}

impl FaceMetrics {
    pub fn from_fixed(pixel_size: u32, fixed: FixedLineMetrics) -> Self {
        let ascender = fixed_to_px(fixed.ascender);
        // Some faces report a positive descender
        let descender = -fixed_to_px(fixed.descender).abs();
        let extent = ascender - descender;
        let line_height = fixed_to_px(fixed.height).max(extent);

        Self {
            pixel_size,
            ascender,
            descender,
            line_height,
        }
    }

    /// Baseline offset from the top of a line
    pub fn baseline(&self) -> i32 {
        self.ascender
    }

    /// Offset from the line top to the top of a bitmap whose top edge sits
    /// `bearing_top` pixels above the baseline
    pub fn bearing_y(&self, bearing_top: i32) -> i32 {
        self.ascender - bearing_top
    }
}
