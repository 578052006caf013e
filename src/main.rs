//! glyphatlas - build a glyph atlas for a string and inspect it
//!
//! Rasterizes the given text into an atlas, prints face metrics, atlas
//! statistics and the laid-out glyph quads, and optionally writes the
//! atlas as a grayscale PNG.

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use glyphatlas::config::Config;
use glyphatlas::font::{find_system_font, GlyphAtlasCache};
use glyphatlas::layout::{Align, LayoutOptions};

const SAMPLE_TEXT: &str = "The quick brown fox\njumps over the lazy dog.\t0123456789";

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    font: Option<String>,
    size: Option<u32>,
    backend: Option<String>,
    out: Option<PathBuf>,
    align: Align,
    text: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let name = arg.as_str();
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match name {
            "--config" | "-c" => parsed.config = Some(value(name)?),
            "--font" | "-f" => parsed.font = Some(value(name)?),
            "--size" | "-s" => {
                let size = value(name)?;
                parsed.size = Some(
                    size.parse()
                        .with_context(|| format!("Invalid pixel size: {}", size))?,
                );
            }
            "--backend" | "-b" => parsed.backend = Some(value(name)?),
            "--out" | "-o" => parsed.out = Some(PathBuf::from(value(name)?)),
            "--align" => {
                parsed.align = match value(name)?.as_str() {
                    "start" | "left" => Align::Start,
                    "center" => Align::Center,
                    "end" | "right" => Align::End,
                    other => bail!("Unknown alignment: {}", other),
                }
            }
            _ => parsed.text.push(arg.clone()),
        }
    }

    Ok(parsed)
}

fn print_help() {
    println!(
        r#"glyphatlas {} - dynamic glyph atlas builder

USAGE:
    glyphatlas [OPTIONS] [TEXT...]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config PATH       Config file (default: ~/.config/glyphatlas/config.toml)
    -f, --font PATH         Font file (default: config, GLYPHATLAS_FONT, system fonts)
    -s, --size PX           Pixel size
    -b, --backend NAME      Rasterizer: freetype | fontdue
    -o, --out PATH          Write the atlas as a grayscale PNG
    --align start|center|end
                            Horizontal line alignment

Escapes \n and \t in TEXT are expanded.

EXAMPLES:
    glyphatlas "Hello, world"
    glyphatlas -f DejaVuSans.ttf -s 48 -o atlas.png "Hello\nworld"
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Save R8 atlas pixels as an 8-bit grayscale PNG
fn write_atlas_png(path: &Path, pixels: &[u8], side_length: u32) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), side_length, side_length);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels)?;

    info!("Atlas saved: {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("glyphatlas {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let args = parse_args(&args)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load(),
    };
    if let Some(font) = args.font {
        config.font.path = font;
    }
    if let Some(size) = args.size {
        config.font.size = size;
    }
    if let Some(backend) = args.backend {
        config.font.backend = backend;
    }
    if config.font.path.is_empty() {
        let path = find_system_font()
            .ok_or_else(|| anyhow!("No font given and no system font found (use --font)"))?;
        config.font.path = path.to_string_lossy().into_owned();
    }

    let text = if args.text.is_empty() {
        SAMPLE_TEXT.to_string()
    } else {
        args.text.join(" ").replace("\\n", "\n").replace("\\t", "\t")
    };

    let mut cache = GlyphAtlasCache::from_config(&config.font, &config.atlas)
        .with_context(|| format!("Failed to open font: {}", config.font.path))?;

    let options = LayoutOptions {
        horizontal: args.align,
        ..Default::default()
    };
    let layout = cache.layout(&text, &options)?;

    let metrics = cache.metrics();
    println!(
        "font: {} ({:?}, {}px)",
        cache.path().display(),
        cache.backend(),
        metrics.pixel_size
    );
    println!(
        "metrics: ascender={} descender={} line_height={}",
        metrics.ascender, metrics.descender, metrics.line_height
    );
    println!(
        "atlas: {}x{}, {} glyphs cached, {} growth(s), {:.1}% occupied",
        cache.side_length(),
        cache.side_length(),
        cache.cache().len(),
        cache.cache().growth_count(),
        cache.cache().occupancy() * 100.0
    );
    println!(
        "layout: {} lines, {}x{} px, {} quads",
        layout.line_count,
        layout.width,
        layout.height,
        layout.quads.len()
    );
    for quad in &layout.quads {
        println!(
            "  {:?} line={} pos=({}, {}) size={}x{} uv=[{:.4}, {:.4}, {:.4}, {:.4}]",
            quad.character,
            quad.line,
            quad.x,
            quad.y,
            quad.width,
            quad.height,
            quad.uv[0],
            quad.uv[1],
            quad.uv[2],
            quad.uv[3]
        );
    }

    if let Some(out) = &args.out {
        let snapshot = cache.atlas_snapshot();
        write_atlas_png(out, snapshot.pixels, snapshot.side_length)?;
        println!("atlas written: {}", out.display());
        cache.mark_clean();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(rest: &[&str]) -> Vec<String> {
        std::iter::once("glyphatlas")
            .chain(rest.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&argv(&[
            "-f", "a.ttf", "--size", "32", "-o", "out.png", "--align", "center", "hello", "world",
        ]))
        .unwrap();
        assert_eq!(args.font.as_deref(), Some("a.ttf"));
        assert_eq!(args.size, Some(32));
        assert_eq!(args.out, Some(PathBuf::from("out.png")));
        assert_eq!(args.align, Align::Center);
        assert_eq!(args.text, vec!["hello", "world"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&argv(&["--size", "big"])).is_err());
        assert!(parse_args(&argv(&["--font"])).is_err());
        assert!(parse_args(&argv(&["--align", "diagonal"])).is_err());
    }
}
