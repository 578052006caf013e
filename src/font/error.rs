//! Glyph cache errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the glyph cache and its facade
#[derive(Debug, Error)]
pub enum GlyphCacheError {
    /// Font file missing, unparsable, or unable to rasterize the reference glyph
    #[error("failed to load font {}: {reason}", .path.display())]
    FontLoad { path: PathBuf, reason: String },

    /// A single glyph does not fit even in the largest allowed atlas
    #[error("glyph {character:?} ({width}x{height}) does not fit in a {max_size}x{max_size} atlas")]
    GlyphTooLarge {
        character: char,
        width: u32,
        height: u32,
        max_size: u32,
    },

    /// A glyph that fit before a growth step could not be re-placed.
    /// Indicates a packer bug, never a user error.
    #[error("atlas invariant violated: {0}")]
    AtlasInvariant(String),
}

impl GlyphCacheError {
    pub(crate) fn font_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::FontLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl GlyphCacheError {
    /// Attach the font path to a load error raised below the facade
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::FontLoad { reason, .. } => Self::FontLoad {
                path: path.into(),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, GlyphCacheError>;
