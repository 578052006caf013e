//! Glyph atlas cache facade
//!
//! Opens a font file at a pixel size with the configured rasterizer and
//! exposes the glyph cache. The font can be swapped at runtime; every
//! successful reload bumps the atlas generation so renderers re-upload.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use super::atlas::AtlasSnapshot;
use super::cache::{GlyphCache, GlyphRecord};
use super::error::{GlyphCacheError, Result};
use super::face::FaceProvider;
use super::fontdue_face::FontdueFace;
use super::freetype::FtFace;
use super::metrics::FaceMetrics;
use crate::config::{AtlasConfig, FontBackend, FontConfig};

/// Font file + pixel size with an on-demand glyph atlas
pub struct GlyphAtlasCache {
    cache: GlyphCache<Box<dyn FaceProvider>>,
    path: PathBuf,
    backend: FontBackend,
    atlas_config: AtlasConfig,
    /// Generations consumed by previous caches (reloads)
    generation_base: u64,
}

impl GlyphAtlasCache {
    /// Open with the FreeType backend and default atlas settings
    pub fn open(path: impl AsRef<Path>, pixel_size: u32) -> Result<Self> {
        Self::open_with(
            path,
            pixel_size,
            FontBackend::default(),
            &AtlasConfig::default(),
        )
    }

    /// Open using the font path, size and backend from configuration
    pub fn from_config(font: &FontConfig, atlas: &AtlasConfig) -> Result<Self> {
        Self::open_with(&font.path, font.size, font.backend(), atlas)
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        pixel_size: u32,
        backend: FontBackend,
        atlas_config: &AtlasConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let cache = build_cache(path, pixel_size, backend, atlas_config)?;

        Ok(Self {
            cache,
            path: path.to_path_buf(),
            backend,
            atlas_config: *atlas_config,
            generation_base: 0,
        })
    }

    /// Wrap an already loaded face, e.g. a custom rasterizer
    ///
    /// `path` is only recorded; later reloads read it with the default backend.
    pub fn with_face(
        face: Box<dyn FaceProvider>,
        path: impl AsRef<Path>,
        pixel_size: u32,
        atlas_config: &AtlasConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let cache = GlyphCache::new(face, pixel_size, atlas_config).map_err(|e| e.with_path(path))?;

        Ok(Self {
            cache,
            path: path.to_path_buf(),
            backend: FontBackend::default(),
            atlas_config: *atlas_config,
            generation_base: 0,
        })
    }

    /// Replace the font and/or size
    ///
    /// On failure the current font stays loaded.
    pub fn reload(&mut self, path: impl AsRef<Path>, pixel_size: u32) -> Result<()> {
        let path = path.as_ref();
        info!(
            "Font reload: {} {}px -> {} {}px",
            self.path.display(),
            self.pixel_size(),
            path.display(),
            pixel_size
        );

        let cache = match build_cache(path, pixel_size, self.backend, &self.atlas_config) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Font reload failed, keeping current font: {}", e);
                return Err(e);
            }
        };

        // Keep the generation strictly increasing across caches
        self.generation_base = self.generation() + 1;
        self.cache = cache;
        self.path = path.to_path_buf();
        Ok(())
    }

    /// Reload the current font at a new pixel size
    pub fn set_pixel_size(&mut self, pixel_size: u32) -> Result<()> {
        let path = self.path.clone();
        self.reload(path, pixel_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pixel_size(&self) -> u32 {
        self.cache.metrics().pixel_size
    }

    pub fn backend(&self) -> FontBackend {
        self.backend
    }

    pub fn metrics(&self) -> FaceMetrics {
        self.cache.metrics()
    }

    pub fn get_glyph(&mut self, ch: char) -> Result<&GlyphRecord> {
        self.cache.get_glyph(ch)
    }

    pub fn get_string_glyphs(&mut self, text: &str) -> Result<Vec<&GlyphRecord>> {
        self.cache.get_string_glyphs(text)
    }

    pub fn preload(&mut self, text: &str) -> Result<()> {
        self.cache.preload(text)
    }

    pub fn glyph(&self, ch: char) -> Option<&GlyphRecord> {
        self.cache.glyph(ch)
    }

    pub fn atlas_snapshot(&self) -> AtlasSnapshot<'_> {
        let mut snapshot = self.cache.atlas_snapshot();
        snapshot.generation = self.generation();
        snapshot
    }

    pub fn side_length(&self) -> u32 {
        self.cache.side_length()
    }

    /// Atlas generation, increasing across growth and reloads
    pub fn generation(&self) -> u64 {
        self.generation_base + self.cache.generation()
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    pub fn mark_clean(&mut self) {
        self.cache.mark_clean()
    }

    /// Underlying cache, for statistics and layout
    pub fn cache(&self) -> &GlyphCache<Box<dyn FaceProvider>> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GlyphCache<Box<dyn FaceProvider>> {
        &mut self.cache
    }
}

fn build_cache(
    path: &Path,
    pixel_size: u32,
    backend: FontBackend,
    atlas_config: &AtlasConfig,
) -> Result<GlyphCache<Box<dyn FaceProvider>>> {
    if !path.is_file() {
        return Err(GlyphCacheError::font_load(path, "font file not found"));
    }

    debug!("Loading {} with {:?} at {}px", path.display(), backend, pixel_size);

    let face: Box<dyn FaceProvider> = match backend {
        FontBackend::FreeType => Box::new(FtFace::load(path)?),
        FontBackend::Fontdue => Box::new(FontdueFace::load(path)?),
    };

    GlyphCache::new(face, pixel_size, atlas_config).map_err(|e| e.with_path(path))
}

/// Search known system font locations
///
/// 1. GLYPHATLAS_FONT environment variable
/// 2. Known paths (hardcoded)
pub fn find_system_font() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("GLYPHATLAS_FONT") {
        let p = PathBuf::from(path);
        if p.is_file() {
            info!("Font found: {} (GLYPHATLAS_FONT)", p.display());
            return Some(p);
        }
        warn!("GLYPHATLAS_FONT does not point to a file: {}", p.display());
    }

    let candidates = [
        // Linux
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        // macOS (development/testing)
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
    ];

    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(|p| {
            info!("Font found: {}", p.display());
            p.to_path_buf()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_nonexistent_path() {
        for backend in [FontBackend::FreeType, FontBackend::Fontdue] {
            let err = GlyphAtlasCache::open_with(
                "/nonexistent/dir/font.ttf",
                24,
                backend,
                &AtlasConfig::default(),
            )
            .err();
            match err {
                Some(GlyphCacheError::FontLoad { path, .. }) => {
                    assert_eq!(path, PathBuf::from("/nonexistent/dir/font.ttf"));
                }
                other => panic!("expected FontLoad, got {:?}", other.map(|e| e.to_string())),
            }
        }
    }

    #[test]
    fn test_open_directory_is_load_error() {
        let dir = std::env::temp_dir();
        let err = GlyphAtlasCache::open(&dir, 24).err();
        assert!(matches!(err, Some(GlyphCacheError::FontLoad { .. })));
    }

    #[test]
    fn test_open_unparsable_file() {
        let path = std::env::temp_dir().join(format!("glyphatlas-garbage-{}.ttf", std::process::id()));
        std::fs::write(&path, b"not a font at all").unwrap();

        for backend in [FontBackend::FreeType, FontBackend::Fontdue] {
            let err = GlyphAtlasCache::open_with(&path, 24, backend, &AtlasConfig::default()).err();
            assert!(matches!(err, Some(GlyphCacheError::FontLoad { .. })));
        }

        let _ = std::fs::remove_file(&path);
    }
}
