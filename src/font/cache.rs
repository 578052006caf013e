//! Glyph cache
//!
//! Rasterizes characters on first request, packs their bitmaps into a
//! single R8 atlas and keeps per-character metrics. When the packer is
//! full the atlas doubles and every cached glyph is re-packed from its
//! retained bitmap, so atlas positions are only stable between growths.

use log::{debug, error, info};
use std::collections::HashMap;
use std::path::PathBuf;

use super::atlas::{AtlasBuffer, AtlasPosition, AtlasSnapshot};
use super::error::{GlyphCacheError, Result};
use super::face::{FaceProvider, RasterizedGlyph};
use super::metrics::{fixed_to_px, FaceMetrics};
use super::packer::SkylinePacker;
use crate::config::AtlasConfig;
use crate::constants::{REFERENCE_CHAR, TAB_WIDTH};

/// Metrics, bitmap and atlas placement for one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRecord {
    pub character: char,
    /// Coverage bytes, row-major, `width * height`; kept for re-packing
    pub bitmap: Vec<u8>,
    /// Pen advance (pixels)
    pub advance: i32,
    /// Pen origin to bitmap left edge
    pub bearing_x: i32,
    /// Line top to bitmap top edge (ascender-relative)
    pub bearing_y: i32,
    pub width: u32,
    pub height: u32,
    /// Top-left in the current atlas; changes whenever the atlas grows
    pub atlas_position: AtlasPosition,
}

impl GlyphRecord {
    /// Advance-only record (whitespace, control, missing glyphs)
    fn empty(character: char, advance: i32) -> Self {
        Self {
            character,
            bitmap: Vec::new(),
            advance,
            bearing_x: 0,
            bearing_y: 0,
            width: 0,
            height: 0,
            atlas_position: AtlasPosition::default(),
        }
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Normalized texture rectangle `[u_min, v_min, u_max, v_max]`
    pub fn uv_rect(&self, side_length: u32) -> [f32; 4] {
        let side = side_length as f32;
        let x = self.atlas_position.x as f32;
        let y = self.atlas_position.y as f32;
        [
            x / side,
            y / side,
            (x + self.width as f32) / side,
            (y + self.height as f32) / side,
        ]
    }
}

/// Character-keyed glyph store that owns the atlas
pub struct GlyphCache<F> {
    face: F,
    metrics: FaceMetrics,
    records: HashMap<char, GlyphRecord>,
    /// Non-empty glyphs in first-request order (re-pack order)
    placed: Vec<char>,
    atlas: AtlasBuffer,
    packer: SkylinePacker,
    padding: u32,
    max_size: u32,
    tab_advance: i32,
    /// Bumped on every atlas replacement
    generation: u64,
    growth_count: u32,
    /// GPU re-upload flag
    dirty: bool,
}

impl<F: FaceProvider> GlyphCache<F> {
    /// Size the face, derive face metrics and seed the atlas
    ///
    /// The reference glyph is rasterized eagerly; a face that cannot
    /// render it is rejected as a load failure.
    pub fn new(mut face: F, pixel_size: u32, atlas_config: &AtlasConfig) -> Result<Self> {
        face.set_pixel_size(pixel_size)
            .map_err(|e| GlyphCacheError::font_load(PathBuf::new(), e))?;

        let metrics = FaceMetrics::from_fixed(pixel_size, face.line_metrics());
        let config = atlas_config.validated();

        let reference = face.rasterize(REFERENCE_CHAR).map_err(|e| {
            GlyphCacheError::font_load(
                PathBuf::new(),
                format!("cannot rasterize reference glyph {:?}: {}", REFERENCE_CHAR, e),
            )
        })?;

        let mut cache = Self {
            face,
            metrics,
            records: HashMap::new(),
            placed: Vec::new(),
            atlas: AtlasBuffer::new(config.initial_size),
            packer: SkylinePacker::new(config.initial_size),
            padding: config.padding,
            max_size: config.max_size,
            tab_advance: 0,
            generation: 0,
            growth_count: 0,
            dirty: true,
        };

        cache.insert_rasterized(REFERENCE_CHAR, reference)?;
        cache.tab_advance = cache.records[&REFERENCE_CHAR].advance * TAB_WIDTH;

        info!(
            "Glyph cache ready: {} {}px, ascender={}, descender={}, line_height={}, atlas {}x{}",
            cache.face.family_name().unwrap_or_else(|| "unknown".to_string()),
            pixel_size,
            metrics.ascender,
            metrics.descender,
            metrics.line_height,
            config.initial_size,
            config.initial_size
        );

        Ok(cache)
    }

    /// Cached record for `ch`, rasterizing and packing it on a miss
    ///
    /// Missing glyphs become advance-less placeholders and are cached
    /// like any other record, so they are never retried.
    pub fn get_glyph(&mut self, ch: char) -> Result<&GlyphRecord> {
        if !self.records.contains_key(&ch) {
            self.resolve(ch)?;
        }
        Ok(&self.records[&ch])
    }

    /// Resolve every distinct uncached character of `text` exactly once
    pub fn preload(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            if !self.records.contains_key(&ch) {
                self.resolve(ch)?;
            }
        }
        Ok(())
    }

    /// One record per character of `text`, in order
    ///
    /// Positions are final for the current atlas generation: all misses
    /// are resolved (and any growth done) before the records are collected.
    pub fn get_string_glyphs(&mut self, text: &str) -> Result<Vec<&GlyphRecord>> {
        self.preload(text)?;
        Ok(text.chars().map(|ch| &self.records[&ch]).collect())
    }

    /// Lookup without rasterizing
    pub fn glyph(&self, ch: char) -> Option<&GlyphRecord> {
        self.records.get(&ch)
    }

    /// All cached records, in no particular order
    pub fn records(&self) -> impl Iterator<Item = &GlyphRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    /// Advance used for `'\t'`
    pub fn tab_advance(&self) -> i32 {
        self.tab_advance
    }

    pub fn family_name(&self) -> Option<String> {
        self.face.family_name()
    }

    pub fn atlas(&self) -> &AtlasBuffer {
        &self.atlas
    }

    pub fn side_length(&self) -> u32 {
        self.atlas.side_length()
    }

    /// Current atlas pixels for texture upload
    ///
    /// Invalid after the next mutating call; compare `generation` with the
    /// last uploaded one to decide between a sub-update and a re-create.
    pub fn atlas_snapshot(&self) -> AtlasSnapshot<'_> {
        AtlasSnapshot {
            pixels: self.atlas.pixels(),
            side_length: self.atlas.side_length(),
            generation: self.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn growth_count(&self) -> u32 {
        self.growth_count
    }

    /// Fraction of the atlas reserved by glyphs (padding included)
    pub fn occupancy(&self) -> f32 {
        self.packer.occupancy()
    }

    /// Atlas pixels changed since the last `mark_clean`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call after uploading the atlas
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn resolve(&mut self, ch: char) -> Result<()> {
        let record = match ch {
            '\n' | '\r' => GlyphRecord::empty(ch, 0),
            '\t' => GlyphRecord::empty(ch, self.tab_advance),
            c if c.is_control() => GlyphRecord::empty(ch, 0),
            _ => match self.face.rasterize(ch) {
                Ok(glyph) => return self.insert_rasterized(ch, glyph),
                Err(e) => {
                    debug!("Placeholder for U+{:04X}: {}", ch as u32, e);
                    GlyphRecord::empty(ch, 0)
                }
            },
        };
        self.records.insert(ch, record);
        Ok(())
    }

    fn insert_rasterized(&mut self, ch: char, glyph: RasterizedGlyph) -> Result<()> {
        let advance = fixed_to_px(glyph.advance_fixed);

        if glyph.is_empty() {
            self.records.insert(ch, GlyphRecord::empty(ch, advance));
            return Ok(());
        }

        let expected = glyph.width as usize * glyph.height as usize;
        if glyph.bitmap.len() < expected {
            debug!(
                "Short bitmap for U+{:04X}: {} < {} bytes, using placeholder",
                ch as u32,
                glyph.bitmap.len(),
                expected
            );
            self.records.insert(ch, GlyphRecord::empty(ch, advance));
            return Ok(());
        }

        let position = self.place(ch, glyph.width, glyph.height)?;
        self.atlas
            .blit(position, glyph.width, glyph.height, &glyph.bitmap);
        self.dirty = true;

        let mut bitmap = glyph.bitmap;
        bitmap.truncate(expected);

        debug!(
            "Glyph U+{:04X} '{}' {}x{} at ({}, {})",
            ch as u32, ch, glyph.width, glyph.height, position.x, position.y
        );

        self.records.insert(
            ch,
            GlyphRecord {
                character: ch,
                bitmap,
                advance,
                bearing_x: glyph.bearing_x,
                bearing_y: self.metrics.bearing_y(glyph.bearing_top),
                width: glyph.width,
                height: glyph.height,
                atlas_position: position,
            },
        );
        self.placed.push(ch);
        Ok(())
    }

    /// Reserve space for a glyph, growing the atlas until it fits or the
    /// size limit is reached
    fn place(&mut self, ch: char, width: u32, height: u32) -> Result<AtlasPosition> {
        let max_size = self.max_size;
        let too_large = || GlyphCacheError::GlyphTooLarge {
            character: ch,
            width,
            height,
            max_size,
        };

        let padded_w = width + self.padding;
        let padded_h = height + self.padding;
        if padded_w > max_size || padded_h > max_size {
            return Err(too_large());
        }

        loop {
            if let Some((x, y)) = self.packer.try_place(padded_w, padded_h) {
                return Ok(AtlasPosition { x, y });
            }
            if self.atlas.side_length() >= max_size {
                return Err(too_large());
            }
            self.grow()?;
        }
    }

    /// Double the atlas and re-pack every placed glyph in request order
    fn grow(&mut self) -> Result<()> {
        let old_side = self.atlas.side_length();
        let new_side = old_side * 2;
        let mut atlas = AtlasBuffer::new(new_side);
        self.packer.reset(new_side);

        for ch in &self.placed {
            let Some(record) = self.records.get_mut(ch) else {
                continue;
            };
            let (x, y) = self
                .packer
                .try_place(record.width + self.padding, record.height + self.padding)
                .ok_or_else(|| {
                    error!(
                        "Re-pack failed for U+{:04X} ({}x{}) in {}x{} atlas",
                        *ch as u32, record.width, record.height, new_side, new_side
                    );
                    GlyphCacheError::AtlasInvariant(format!(
                        "glyph {:?} ({}x{}) no longer fits after growing to {}",
                        ch, record.width, record.height, new_side
                    ))
                })?;
            record.atlas_position = AtlasPosition { x, y };
            atlas.blit(record.atlas_position, record.width, record.height, &record.bitmap);
        }

        self.atlas = atlas;
        self.generation += 1;
        self.growth_count += 1;
        self.dirty = true;

        info!(
            "Glyph atlas grown: {}x{} -> {}x{} ({} glyphs re-packed)",
            old_side,
            old_side,
            new_side,
            new_side,
            self.placed.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::face::testing::MockFace;

    fn cache(size: u32) -> GlyphCache<MockFace> {
        GlyphCache::new(MockFace::new(), size, &AtlasConfig::default()).unwrap()
    }

    fn overlaps(a: &GlyphRecord, b: &GlyphRecord) -> bool {
        let (ax, ay) = (a.atlas_position.x, a.atlas_position.y);
        let (bx, by) = (b.atlas_position.x, b.atlas_position.y);
        ax < bx + b.width && bx < ax + a.width && ay < by + b.height && by < ay + a.height
    }

    fn assert_no_overlap<F: FaceProvider>(cache: &GlyphCache<F>) {
        let placed: Vec<&GlyphRecord> = cache.records().filter(|r| !r.is_empty()).collect();
        for (i, a) in placed.iter().enumerate() {
            assert!(a.atlas_position.x + a.width <= cache.side_length());
            assert!(a.atlas_position.y + a.height <= cache.side_length());
            for b in &placed[i + 1..] {
                assert!(!overlaps(a, b), "{:?} overlaps {:?}", a.character, b.character);
            }
        }
    }

    fn assert_atlas_matches_bitmaps<F: FaceProvider>(cache: &GlyphCache<F>) {
        for record in cache.records().filter(|r| !r.is_empty()) {
            let region = cache
                .atlas()
                .read_region(record.atlas_position, record.width, record.height);
            assert_eq!(region, record.bitmap, "atlas content for {:?}", record.character);
        }
    }

    /// Distinct renderable characters from Latin Extended onward
    fn many_chars(count: u32) -> String {
        (0x100..0x100 + count).filter_map(char::from_u32).collect()
    }

    #[test]
    fn test_construction_seeds_reference_glyph() {
        let cache = cache(24);
        assert_eq!(cache.side_length(), 256);
        assert_eq!(cache.len(), 1);
        let a = cache.glyph('a').unwrap();
        assert!(!a.is_empty());
        assert_eq!(a.atlas_position, AtlasPosition { x: 0, y: 0 });
        assert_eq!(cache.family_name().as_deref(), Some("Mock Sans"));
    }

    #[test]
    fn test_face_metrics() {
        let m = cache(24).metrics();
        assert_eq!(m.pixel_size, 24);
        assert_eq!(m.ascender, 19);
        assert_eq!(m.descender, -6);
        assert_eq!(m.line_height, 28);
    }

    #[test]
    fn test_zero_size_is_load_error() {
        let err = GlyphCache::new(MockFace::new(), 0, &AtlasConfig::default()).err();
        assert!(matches!(err, Some(GlyphCacheError::FontLoad { .. })));
    }

    #[test]
    fn test_missing_reference_glyph_is_load_error() {
        let face = MockFace::new().without(REFERENCE_CHAR);
        let err = GlyphCache::new(face, 24, &AtlasConfig::default()).err();
        assert!(matches!(err, Some(GlyphCacheError::FontLoad { .. })));
    }

    #[test]
    fn test_glyph_metrics_derivation() {
        let mut cache = cache(24);
        let (w, h) = MockFace::glyph_size('b', 24);
        let b = cache.get_glyph('b').unwrap().clone();
        assert_eq!((b.width, b.height), (w, h));
        // (w + 2) * 64 + 40 truncates to w + 2
        assert_eq!(b.advance, w as i32 + 2);
        assert_eq!(b.bearing_x, 1);
        // ascender - bearing_top
        assert_eq!(b.bearing_y, 19 - (h as i32 - 2));
        assert_eq!(b.bitmap.len(), (w * h) as usize);
    }

    #[test]
    fn test_idempotent_caching() {
        let face = MockFace::new();
        let calls = face.calls.clone();
        let mut cache = GlyphCache::new(face, 24, &AtlasConfig::default()).unwrap();

        let first = cache.get_glyph('q').unwrap().clone();
        let after_first = calls.get();
        let second = cache.get_glyph('q').unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(calls.get(), after_first);
    }

    #[test]
    fn test_whitespace_handling() {
        let mut cache = cache(24);
        let a_advance = cache.get_glyph('a').unwrap().advance;

        let tab = cache.get_glyph('\t').unwrap();
        assert_eq!(tab.advance, 4 * a_advance);
        assert!(tab.is_empty());

        for ch in ['\n', '\r', '\u{7}'] {
            let record = cache.get_glyph(ch).unwrap();
            assert_eq!((record.width, record.height), (0, 0));
            assert_eq!(record.advance, 0);
            assert!(record.bitmap.is_empty());
            assert_eq!(record.atlas_position, AtlasPosition::default());
        }

        let space = cache.get_glyph(' ').unwrap();
        assert!(space.is_empty());
        assert_eq!(space.advance, 8);
    }

    #[test]
    fn test_newline_never_rasterized() {
        let face = MockFace::new();
        let calls = face.calls.clone();
        let mut cache = GlyphCache::new(face, 24, &AtlasConfig::default()).unwrap();
        let before = calls.get();
        cache.get_string_glyphs("\n\r\t").unwrap();
        assert_eq!(calls.get(), before);
    }

    #[test]
    fn test_missing_glyph_is_cached_placeholder() {
        let face = MockFace::new().without('\u{2603}');
        let calls = face.calls.clone();
        let mut cache = GlyphCache::new(face, 24, &AtlasConfig::default()).unwrap();

        let glyphs = cache.get_string_glyphs("x\u{2603}y").unwrap();
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[1].is_empty());
        assert_eq!(glyphs[1].advance, 0);
        assert!(!glyphs[0].is_empty() && !glyphs[2].is_empty());

        let before = calls.get();
        cache.get_glyph('\u{2603}').unwrap();
        assert_eq!(calls.get(), before);
    }

    #[test]
    fn test_order_preservation() {
        let mut cache = cache(24);
        let glyphs = cache.get_string_glyphs("abca").unwrap();
        assert_eq!(glyphs.len(), 4);
        assert!(std::ptr::eq(glyphs[0], glyphs[3]));
        assert_eq!(glyphs[0].character, 'a');
        assert_eq!(glyphs[1].character, 'b');
        assert_eq!(glyphs[2].character, 'c');
        assert_ne!(glyphs[0], glyphs[1]);
        assert_ne!(glyphs[0], glyphs[2]);
    }

    #[test]
    fn test_batch_resolves_each_char_once() {
        let face = MockFace::new();
        let calls = face.calls.clone();
        let mut cache = GlyphCache::new(face, 24, &AtlasConfig::default()).unwrap();
        let before = calls.get();
        cache.get_string_glyphs("mississippi").unwrap();
        // m, i, s, p
        assert_eq!(calls.get() - before, 4);
    }

    #[test]
    fn test_placements_do_not_overlap() {
        let mut cache = cache(24);
        cache.preload(&many_chars(60)).unwrap();
        assert_eq!(cache.growth_count(), 0);
        assert_no_overlap(&cache);
        assert_atlas_matches_bitmaps(&cache);
    }

    #[test]
    fn test_growth_scenario() {
        let mut cache = cache(24);
        let text = many_chars(300);
        let glyphs = cache.get_string_glyphs(&text).unwrap();
        assert_eq!(glyphs.len(), 300);

        assert!(cache.growth_count() >= 1);
        assert!(cache.side_length() >= 512);
        assert!(cache.side_length().is_power_of_two());
        assert_eq!(cache.generation(), cache.growth_count() as u64);
        assert_no_overlap(&cache);
        assert_atlas_matches_bitmaps(&cache);
    }

    #[test]
    fn test_growth_doubles_and_preserves_content() {
        let mut cache = cache(24);
        let mut side = cache.side_length();
        for ch in many_chars(300).chars() {
            cache.get_glyph(ch).unwrap();
            let new_side = cache.side_length();
            if new_side != side {
                assert_eq!(new_side, side * 2);
                assert_atlas_matches_bitmaps(&cache);
                assert_no_overlap(&cache);
                side = new_side;
            }
        }
        assert!(cache.growth_count() >= 1);
    }

    #[test]
    fn test_snapshot_tracks_generation() {
        let mut cache = cache(24);
        let first = cache.atlas_snapshot();
        assert_eq!(first.generation, 0);
        assert_eq!(first.pixels.len(), 256 * 256);

        cache.preload(&many_chars(300)).unwrap();
        let snapshot = cache.atlas_snapshot();
        assert!(snapshot.generation > 0);
        assert_eq!(
            snapshot.pixels.len(),
            (snapshot.side_length * snapshot.side_length) as usize
        );
    }

    #[test]
    fn test_dirty_flag() {
        let mut cache = cache(24);
        assert!(cache.is_dirty());
        cache.mark_clean();
        cache.get_glyph(' ').unwrap();
        assert!(!cache.is_dirty());
        cache.get_glyph('z').unwrap();
        assert!(cache.is_dirty());
    }

    #[test]
    fn test_grows_repeatedly_for_one_large_glyph() {
        let config = AtlasConfig {
            initial_size: 32,
            max_size: 256,
            padding: 1,
        };
        let face = MockFace::new().with_giant('W', 100);
        let mut cache = GlyphCache::new(face, 24, &config).unwrap();
        assert_eq!(cache.side_length(), 32);

        let w = cache.get_glyph('W').unwrap().clone();
        assert_eq!((w.width, w.height), (100, 100));
        assert_eq!(cache.side_length(), 128);
        assert_eq!(cache.growth_count(), 2);
        assert_no_overlap(&cache);
        assert_atlas_matches_bitmaps(&cache);
    }

    #[test]
    fn test_glyph_too_large() {
        let config = AtlasConfig {
            initial_size: 64,
            max_size: 128,
            padding: 1,
        };
        let face = MockFace::new().with_giant('W', 200);
        let mut cache = GlyphCache::new(face, 24, &config).unwrap();

        let err = cache.get_glyph('W').err();
        assert!(matches!(
            err,
            Some(GlyphCacheError::GlyphTooLarge {
                character: 'W',
                max_size: 128,
                ..
            })
        ));
        assert!(cache.glyph('W').is_none());
        assert_eq!(cache.side_length(), 64);

        assert!(cache.get_string_glyphs("aWa").is_err());
    }

    #[test]
    fn test_oversized_reference_glyph_is_too_large() {
        let config = AtlasConfig {
            initial_size: 64,
            max_size: 128,
            padding: 1,
        };
        let face = MockFace::new().with_giant(REFERENCE_CHAR, 300);
        let err = GlyphCache::new(face, 24, &config).err();
        assert!(matches!(
            err,
            Some(GlyphCacheError::GlyphTooLarge {
                character: REFERENCE_CHAR,
                width: 300,
                height: 300,
                max_size: 128,
            })
        ));
    }

    #[test]
    fn test_full_atlas_at_max_size() {
        let config = AtlasConfig {
            initial_size: 32,
            max_size: 64,
            padding: 1,
        };
        let mut cache = GlyphCache::new(MockFace::new(), 24, &config).unwrap();
        let err = cache.preload(&many_chars(40)).err();
        assert!(matches!(err, Some(GlyphCacheError::GlyphTooLarge { .. })));
        assert_eq!(cache.side_length(), 64);
        assert_no_overlap(&cache);
        assert_atlas_matches_bitmaps(&cache);
    }

    #[test]
    fn test_uv_rect() {
        let record = GlyphRecord {
            character: 'x',
            bitmap: vec![0; 8 * 16],
            advance: 9,
            bearing_x: 0,
            bearing_y: 0,
            width: 8,
            height: 16,
            atlas_position: AtlasPosition { x: 64, y: 32 },
        };
        let uv = record.uv_rect(128);
        assert_eq!(uv, [0.5, 0.25, 0.5625, 0.375]);
    }
}
