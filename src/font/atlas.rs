//! Atlas pixel buffer
//!
//! Single-channel (R8) square texture data. The side length is always a
//! power of two. Growth builds a new buffer instead of resizing in place.

/// Top-left corner of a glyph inside the atlas (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AtlasPosition {
    pub x: u32,
    pub y: u32,
}

/// Read-only view of the atlas for texture upload
#[derive(Debug, Clone, Copy)]
pub struct AtlasSnapshot<'a> {
    /// R8 pixels, row-major, `side_length * side_length` bytes
    pub pixels: &'a [u8],
    pub side_length: u32,
    /// Bumped whenever the buffer is replaced
    pub generation: u64,
}

/// CPU-side atlas texture data
#[derive(Debug, Clone)]
pub struct AtlasBuffer {
    side_length: u32,
    pixels: Vec<u8>,
}

impl AtlasBuffer {
    /// Allocate a zeroed square atlas
    ///
    /// `side_length` must be a power of two.
    pub fn new(side_length: u32) -> Self {
        debug_assert!(side_length.is_power_of_two());
        Self {
            side_length,
            pixels: vec![0u8; (side_length as usize) * (side_length as usize)],
        }
    }

    pub fn side_length(&self) -> u32 {
        self.side_length
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy a `width` x `height` bitmap into the atlas at `pos`
    ///
    /// Panics if the region leaves the atlas or the bitmap is short,
    /// like `read_region`.
    pub fn blit(&mut self, pos: AtlasPosition, width: u32, height: u32, bitmap: &[u8]) {
        let side = self.side_length as usize;
        let (w, h) = (width as usize, height as usize);
        assert!(
            pos.x as usize + w <= side && pos.y as usize + h <= side,
            "blit {}x{} at ({}, {}) outside {}x{} atlas",
            width,
            height,
            pos.x,
            pos.y,
            side,
            side
        );

        for row in 0..h {
            let src = row * w;
            let dst = (pos.y as usize + row) * side + pos.x as usize;
            self.pixels[dst..dst + w].copy_from_slice(&bitmap[src..src + w]);
        }
    }

    /// Copy a region back out of the atlas
    pub fn read_region(&self, pos: AtlasPosition, width: u32, height: u32) -> Vec<u8> {
        let side = self.side_length as usize;
        let (w, h) = (width as usize, height as usize);
        let mut out = Vec::with_capacity(w * h);
        for row in 0..h {
            let start = (pos.y as usize + row) * side + pos.x as usize;
            out.extend_from_slice(&self.pixels[start..start + w]);
        }
        out
    }
}
