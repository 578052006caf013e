//! glyphatlas - dynamic glyph atlas cache
//!
//! Loads a font face at a pixel size, rasterizes characters on demand and
//! packs them into a single growable R8 texture atlas. Callers get per-glyph
//! metrics and atlas coordinates, laid-out glyph quads, and the atlas pixels
//! for upload.

pub mod config;
pub mod constants;
pub mod font;
pub mod layout;

pub use config::{AtlasConfig, Config, FontBackend, FontConfig};
pub use font::{
    AtlasSnapshot, FaceMetrics, FaceProvider, GlyphAtlasCache, GlyphCache, GlyphCacheError,
    GlyphRecord,
};
pub use layout::{layout_text, Align, GlyphQuad, LayoutOptions, TextLayout};
