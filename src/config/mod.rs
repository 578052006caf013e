//! Configuration file management
//!
//! Loads TOML configuration files and provides font and atlas settings.
//! Default config path: ~/.config/glyphatlas/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ATLAS_SIZE, DEFAULT_GLYPH_PADDING, DEFAULT_PIXEL_SIZE, MAX_ATLAS_SIZE,
    MAX_GLYPH_PADDING, MIN_ATLAS_SIZE,
};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Atlas settings
    pub atlas: AtlasConfig,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file path (searches known system paths if empty)
    pub path: String,
    /// Pixel size
    pub size: u32,
    /// Rasterizer: "freetype" (default) or "fontdue"
    pub backend: String,
}

/// Atlas settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Initial side length, rounded up to a power of two
    pub initial_size: u32,
    /// Growth stops at this side length, rounded up to a power of two
    pub max_size: u32,
    /// Empty pixels right of and below every glyph
    pub padding: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            size: DEFAULT_PIXEL_SIZE,
            backend: "freetype".to_string(),
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_ATLAS_SIZE,
            max_size: MAX_ATLAS_SIZE,
            padding: DEFAULT_GLYPH_PADDING,
        }
    }
}

impl AtlasConfig {
    /// Clamp to supported ranges with power-of-two sizes and
    /// `initial_size <= max_size`
    pub fn validated(&self) -> Self {
        let max_size = self
            .max_size
            .clamp(MIN_ATLAS_SIZE, MAX_ATLAS_SIZE)
            .next_power_of_two();
        let initial_size = self
            .initial_size
            .clamp(MIN_ATLAS_SIZE, max_size)
            .next_power_of_two();

        if initial_size != self.initial_size || max_size != self.max_size {
            warn!(
                "Atlas size adjusted: initial {} -> {}, max {} -> {}",
                self.initial_size, initial_size, self.max_size, max_size
            );
        }

        Self {
            initial_size,
            max_size,
            padding: self.padding.min(MAX_GLYPH_PADDING),
        }
    }
}

/// Rasterization library used to read the font file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontBackend {
    /// FreeType (freetype-rs), 26.6 metrics straight from the face
    #[default]
    FreeType,
    /// fontdue, pure Rust
    Fontdue,
}

impl FontBackend {
    /// Convert from config string
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "fontdue" => Self::Fontdue,
            "freetype" | "ft" => Self::FreeType,
            other => {
                warn!("Unknown font backend '{}', using freetype", other);
                Self::FreeType
            }
        }
    }
}

impl FontConfig {
    pub fn backend(&self) -> FontBackend {
        FontBackend::from_str(&self.backend)
    }
}

impl Config {
    /// Search for the config file
    ///
    /// 1. GLYPHATLAS_CONFIG environment variable
    /// 2. User config: ~/.config/glyphatlas/config.toml
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GLYPHATLAS_CONFIG") {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        default_config_path().filter(|p| p.exists())
    }

    /// Load settings, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glyphatlas").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.font.size, 24);
        assert_eq!(config.font.backend(), FontBackend::FreeType);
        assert_eq!(config.atlas.initial_size, 256);
        assert_eq!(config.atlas.max_size, 8192);
        assert_eq!(config.atlas.padding, 1);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [font]
            path = "/tmp/font.ttf"
            backend = "fontdue"

            [atlas]
            initial_size = 128
            "#,
        )
        .unwrap();
        assert_eq!(config.font.path, "/tmp/font.ttf");
        assert_eq!(config.font.size, 24);
        assert_eq!(config.font.backend(), FontBackend::Fontdue);
        assert_eq!(config.atlas.initial_size, 128);
        assert_eq!(config.atlas.max_size, 8192);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        assert!(Config::from_toml("[font]\nsize = \"big\"").is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(FontBackend::from_str("FontDue"), FontBackend::Fontdue);
        assert_eq!(FontBackend::from_str("ft"), FontBackend::FreeType);
        assert_eq!(FontBackend::from_str("cairo"), FontBackend::FreeType);
    }

    #[test]
    fn test_atlas_validated() {
        let atlas = AtlasConfig {
            initial_size: 300,
            max_size: 1000,
            padding: 99,
        }
        .validated();
        assert_eq!(atlas.initial_size, 512);
        assert_eq!(atlas.max_size, 1024);
        assert_eq!(atlas.padding, MAX_GLYPH_PADDING);

        let atlas = AtlasConfig {
            initial_size: 4096,
            max_size: 64,
            padding: 0,
        }
        .validated();
        assert_eq!(atlas.initial_size, 64);
        assert_eq!(atlas.max_size, 64);
        assert_eq!(atlas.padding, 0);

        let atlas = AtlasConfig {
            initial_size: 1,
            max_size: u32::MAX,
            padding: 1,
        }
        .validated();
        assert_eq!(atlas.initial_size, MIN_ATLAS_SIZE);
        assert_eq!(atlas.max_size, MAX_ATLAS_SIZE);
    }
}
