//! Slide image rendering.
//!
//! Draws one 1920x1080 PNG per slide:
//! - theme background
//! - slide text split on explicit line breaks, word-wrapped, and vertically
//!   centered around the canvas midpoint
//! - the slide number in the bottom-right corner
//!
//! Output depends only on the inputs and the loaded fonts. The project's
//! font family picks a font registered from the font directory, else the
//! default font is used.

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use slidecast_models::{ProjectSettings, SlideTemplate};

use crate::encoding::{VIDEO_HEIGHT, VIDEO_WIDTH};
use crate::error::{MediaError, MediaResult};

/// Horizontal margin kept clear of text on both sides.
const SIDE_MARGIN: f32 = 160.0;
/// Vertical margin kept clear of text.
const VERTICAL_MARGIN: f32 = 90.0;
/// Slide number marker anchor (right edge, top).
const MARKER_X: f32 = 1850.0;
const MARKER_Y: f32 = 1020.0;
const MARKER_FONT_SIZE: f32 = 24.0;

/// Fonts tried when no font path is configured.
const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansKR-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Center,
    Left,
}

/// Per-template text metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextStyleSpec {
    font_size: f32,
    line_height: f32,
    align: Align,
}

impl TextStyleSpec {
    fn for_template(template: SlideTemplate) -> Self {
        match template {
            SlideTemplate::Text => Self {
                font_size: 48.0,
                line_height: 60.0,
                align: Align::Center,
            },
            SlideTemplate::TitleImage => Self {
                font_size: 64.0,
                line_height: 80.0,
                align: Align::Center,
            },
            SlideTemplate::Code => Self {
                font_size: 36.0,
                line_height: 48.0,
                align: Align::Left,
            },
        }
    }

    fn max_width(&self) -> f32 {
        VIDEO_WIDTH as f32 - 2.0 * SIDE_MARGIN
    }

    fn max_lines(&self) -> usize {
        ((VIDEO_HEIGHT as f32 - 2.0 * VERTICAL_MARGIN) / self.line_height).floor() as usize
    }
}

/// A positioned line of text, `y` being the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Draws slide images.
///
/// Called from blocking threads, so implementations may do CPU-heavy work.
pub trait SlideRenderer: Send + Sync {
    /// Render a slide to PNG bytes. `index` is the 1-based slide number.
    fn render(
        &self,
        text: &str,
        index: u32,
        template: SlideTemplate,
        settings: &ProjectSettings,
    ) -> MediaResult<Vec<u8>>;

    /// Fallback image for a slide whose render failed.
    fn error_card(&self, index: u32, settings: &ProjectSettings) -> MediaResult<Vec<u8>>;
}

/// Renders slide PNGs with fontdue.
pub struct SlideImageRenderer {
    /// `None` draws backgrounds and markers only
    font: Option<Font>,
    /// Fonts selectable through `ProjectSettings::font`, keyed by lowercase family
    families: HashMap<String, Font>,
}

impl SlideImageRenderer {
    /// Load the font at `font_path`, or the first available system font.
    ///
    /// An explicitly configured font that cannot be loaded is an error.
    /// Without any usable font the renderer still produces images, minus text.
    pub fn load(font_path: Option<&Path>) -> MediaResult<Self> {
        if let Some(path) = font_path {
            let bytes = std::fs::read(path).map_err(|e| {
                MediaError::font_unavailable(format!("{}: {}", path.display(), e))
            })?;
            return Self::from_font_bytes(bytes);
        }

        for candidate in FALLBACK_FONT_PATHS {
            if let Ok(bytes) = std::fs::read(candidate) {
                if let Ok(renderer) = Self::from_font_bytes(bytes) {
                    debug!(font = candidate, "Loaded slide font");
                    return Ok(renderer);
                }
            }
        }

        warn!("No slide font found; set SLIDE_FONT_PATH. Slides will render without text");
        Ok(Self::without_font())
    }

    /// Build from raw TTF/OTF bytes.
    pub fn from_font_bytes(bytes: Vec<u8>) -> MediaResult<Self> {
        Ok(Self {
            font: Some(parse_font(bytes)?),
            families: HashMap::new(),
        })
    }

    /// Renderer that draws no glyphs.
    pub fn without_font() -> Self {
        Self {
            font: None,
            families: HashMap::new(),
        }
    }

    /// Register every `.ttf`/`.otf` in `dir` as a family named after its file stem.
    ///
    /// `Inter.ttf` serves projects whose font is `inter`. Files that fail to
    /// parse are skipped. A missing directory is an error.
    pub fn with_font_dir(mut self, dir: &Path) -> MediaResult<Self> {
        let files = font_files(dir)
            .map_err(|e| MediaError::font_unavailable(format!("{}: {}", dir.display(), e)))?;

        for (family, path) in files {
            let parsed = std::fs::read(&path)
                .map_err(|e| MediaError::font_unavailable(e.to_string()))
                .and_then(parse_font);
            match parsed {
                Ok(font) => {
                    debug!(family = %family, path = %path.display(), "Loaded font family");
                    self.families.insert(family, font);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable font"),
            }
        }
        Ok(self)
    }

    /// Register a font family from raw bytes.
    pub fn with_family(mut self, family: &str, bytes: Vec<u8>) -> MediaResult<Self> {
        self.families.insert(family.to_lowercase(), parse_font(bytes)?);
        Ok(self)
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Font for a project's family name, falling back to the default font.
    fn font_for(&self, family: &str) -> Option<&Font> {
        self.families
            .get(&family.trim().to_lowercase())
            .or(self.font.as_ref())
    }

    fn render_canvas(
        &self,
        text: &str,
        index: u32,
        template: SlideTemplate,
        settings: &ProjectSettings,
    ) -> RgbaImage {
        let font = self.font_for(&settings.font);
        let theme = settings.color_theme;
        let [r, g, b] = theme.background_rgb();
        let mut canvas = RgbaImage::from_pixel(VIDEO_WIDTH, VIDEO_HEIGHT, Rgba([r, g, b, 255]));

        let accent = theme.accent_rgb();
        fill_rect(&mut canvas, 0, 0, VIDEO_WIDTH, 12, accent);

        let style = TextStyleSpec::for_template(template);
        let lines = layout_text(text, &style, |s| measure(font, s, style.font_size));

        let [tr, tg, tb] = theme.text_rgb();
        for line in &lines {
            draw_text(font, &mut canvas, &line.text, line.x, line.y, style.font_size, [tr, tg, tb, 255]);
        }

        let marker = index.to_string();
        let marker_width = measure(font, &marker, MARKER_FONT_SIZE);
        let [ar, ag, ab] = accent;
        draw_text(
            font,
            &mut canvas,
            &marker,
            MARKER_X - marker_width,
            MARKER_Y,
            MARKER_FONT_SIZE,
            [ar, ag, ab, 255],
        );

        canvas
    }
}

impl SlideRenderer for SlideImageRenderer {
    fn render(
        &self,
        text: &str,
        index: u32,
        template: SlideTemplate,
        settings: &ProjectSettings,
    ) -> MediaResult<Vec<u8>> {
        let canvas = self.render_canvas(text, index, template, settings);
        encode_png(&canvas)
    }

    fn error_card(&self, index: u32, settings: &ProjectSettings) -> MediaResult<Vec<u8>> {
        let canvas = self.render_canvas(
            &format!("Slide {}", index),
            index,
            SlideTemplate::TitleImage,
            settings,
        );
        encode_png(&canvas)
    }
}

fn parse_font(bytes: Vec<u8>) -> MediaResult<Font> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|e| MediaError::font_unavailable(e.to_string()))
}

/// `(family, path)` for each font file in `dir`, sorted by family.
fn font_files(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
        if !is_font {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_lowercase(), path));
        }
    }
    files.sort();
    Ok(files)
}

/// Advance width of `text` at `size`.
fn measure(font: Option<&Font>, text: &str, size: f32) -> f32 {
    match font {
        Some(font) => text.chars().map(|c| font.metrics(c, size).advance_width).sum(),
        None => approximate_width(text, size),
    }
}

fn draw_text(font: Option<&Font>, canvas: &mut RgbaImage, text: &str, x: f32, y: f32, size: f32, color: [u8; 4]) {
    let Some(font) = font else {
        return;
    };

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x,
        y,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, size, 0));

    let (width, height) = canvas.dimensions();
    let frame: &mut [u8] = canvas;
    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        let (_, bitmap) = font.rasterize_config(glyph.key);
        blend_glyph(
            frame,
            width,
            height,
            glyph.x.round() as i32,
            glyph.y.round() as i32,
            glyph.width,
            &bitmap,
            color,
        );
    }
}

/// Width estimate used when no font is loaded.
fn approximate_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| if c.is_ascii() { size * 0.55 } else { size })
        .sum()
}

/// Split, wrap and position `text` for `style`.
fn layout_text(text: &str, style: &TextStyleSpec, measure: impl Fn(&str) -> f32) -> Vec<PlacedLine> {
    let mut lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_line(line, style.max_width(), &measure))
        .collect();

    // Trailing blank lines would shift the block upward
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let max_lines = style.max_lines();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }

    let center_y = VIDEO_HEIGHT as f32 / 2.0;
    let start_y = center_y - lines.len() as f32 * style.line_height / 2.0;

    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let x = match style.align {
                Align::Left => SIDE_MARGIN,
                Align::Center => (VIDEO_WIDTH as f32 - measure(&text)) / 2.0,
            };
            PlacedLine {
                x: x.max(0.0),
                y: start_y + i as f32 * style.line_height,
                text,
            }
        })
        .collect()
}

/// Greedy word wrap. Words wider than a line are broken by character.
fn wrap_line(line: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }
    if measure(line) <= max_width {
        return vec![line.trim_end().to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        if measure(word) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                current.push(c);
                if measure(&current) > max_width {
                    current.pop();
                    out.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
    let (width, height) = canvas.dimensions();
    for py in y..(y + h).min(height) {
        for px in x..(x + w).min(width) {
            canvas.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn blend_glyph(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    x: i32,
    y: i32,
    glyph_width: usize,
    bitmap: &[u8],
    color: [u8; 4],
) {
    for (row, coverage_row) in bitmap.chunks(glyph_width).enumerate() {
        let py = y + row as i32;
        if py < 0 || py >= frame_height as i32 {
            continue;
        }
        for (col, &mask) in coverage_row.iter().enumerate() {
            let px = x + col as i32;
            if px < 0 || px >= frame_width as i32 || mask == 0 {
                continue;
            }
            let alpha = ((u16::from(mask) * u16::from(color[3])) / 255) as u8;
            let idx = ((py as u32 * frame_width + px as u32) * 4) as usize;
            blend_pixel(frame, idx, [color[0], color[1], color[2], alpha]);
        }
    }
}

fn blend_pixel(frame: &mut [u8], idx: usize, src: [u8; 4]) {
    let alpha = u16::from(src[3]);
    if alpha == 0 {
        return;
    }
    let inv_alpha = 255_u16 - alpha;
    for channel in 0..3 {
        let dst = u16::from(frame[idx + channel]);
        let src_c = u16::from(src[channel]);
        frame[idx + channel] = ((src_c * alpha + dst * inv_alpha + 127) / 255) as u8;
    }
    frame[idx + 3] = 255;
}

fn encode_png(canvas: &RgbaImage) -> MediaResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ColorType::Rgba8,
    )?;
    Ok(bytes)
}
