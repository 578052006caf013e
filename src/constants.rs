//! Global constants for glyphatlas
//!
//! Atlas sizing, whitespace handling, and rasterization limits.

// ============================================================================
// Atlas Sizing
// ============================================================================

/// Default initial atlas side length (pixels)
pub const DEFAULT_ATLAS_SIZE: u32 = 256;

/// Smallest atlas side length accepted from configuration
pub const MIN_ATLAS_SIZE: u32 = 16;

/// Upper bound for atlas growth (8192x8192 R8 = 64 MiB)
pub const MAX_ATLAS_SIZE: u32 = 8192;

/// Empty pixels kept right of and below each glyph to prevent sampling bleed
pub const DEFAULT_GLYPH_PADDING: u32 = 1;

/// Largest padding accepted from configuration
pub const MAX_GLYPH_PADDING: u32 = 16;

// ============================================================================
// Glyph Handling
// ============================================================================

/// Character rasterized eagerly at construction; seeds the tab width
pub const REFERENCE_CHAR: char = 'a';

/// Tab advance in multiples of the reference character's advance
pub const TAB_WIDTH: i32 = 4;

/// Default pixel size when none is configured
pub const DEFAULT_PIXEL_SIZE: u32 = 24;
