//! Font loading and glyph atlas management
//!
//! Handles:
//! - TTF/OTF face loading (freetype / fontdue)
//! - Face metrics in whole pixels
//! - On-demand rasterization into a growable R8 atlas
//! - Skyline rectangle packing

pub mod atlas;
pub mod atlas_cache;
pub mod cache;
pub mod error;
pub mod face;
pub mod fontdue_face;
pub mod freetype;
pub mod metrics;
pub mod packer;

pub use atlas::{AtlasBuffer, AtlasPosition, AtlasSnapshot};
pub use atlas_cache::{find_system_font, GlyphAtlasCache};
pub use cache::{GlyphCache, GlyphRecord};
pub use error::GlyphCacheError;
pub use face::{FaceError, FaceProvider, FixedLineMetrics, RasterizedGlyph};
pub use fontdue_face::FontdueFace;
pub use freetype::FtFace;
pub use metrics::FaceMetrics;
pub use packer::SkylinePacker;
