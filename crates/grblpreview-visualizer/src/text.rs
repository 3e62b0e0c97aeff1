//! Text rasterisation onto tiny-skia pixmaps.
//!
//! Uses the first monospace (or sans-serif) system font found by fontdb. When
//! no font is available measurement falls back to a fixed-pitch estimate and
//! drawing is skipped, so layout stays deterministic on headless machines.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use grblpreview_core::Rgba;
use rusttype::{point, Font, Scale};
use std::sync::OnceLock;
use tiny_skia::Pixmap;
use tracing::{debug, warn};

/// Advance of one character, as a fraction of the pixel size, when no font is loaded
const FALLBACK_ADVANCE: f32 = 0.6;
/// Line height as a fraction of the pixel size when no font is loaded
const FALLBACK_LINE_HEIGHT: f32 = 1.2;

pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    /// Shared renderer backed by the system font database
    pub fn global() -> &'static TextRenderer {
        static RENDERER: OnceLock<TextRenderer> = OnceLock::new();
        RENDERER.get_or_init(TextRenderer::from_system)
    }

    pub fn from_system() -> Self {
        let font = load_system_font();
        if font.is_none() {
            warn!("No system font found; preview status text will not be drawn");
        }
        Self { font }
    }

    pub fn from_font(font: Font<'static>) -> Self {
        Self { font: Some(font) }
    }

    /// Renderer that measures with the fixed-pitch estimate and draws nothing
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn line_height(&self, px: f32) -> f32 {
        match &self.font {
            Some(font) => {
                let v = font.v_metrics(Scale::uniform(px));
                (v.ascent - v.descent + v.line_gap).ceil()
            }
            None => (px * FALLBACK_LINE_HEIGHT).round(),
        }
    }

    /// Width of a single line in pixels
    pub fn line_width(&self, text: &str, px: f32) -> f32 {
        match &self.font {
            Some(font) => {
                let scale = Scale::uniform(px);
                font.layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0)
                    .ceil()
            }
            None => (text.chars().count() as f32 * px * FALLBACK_ADVANCE).round(),
        }
    }

    /// Size of a block of lines: (widest line, total height)
    pub fn measure<S: AsRef<str>>(&self, lines: &[S], px: f32) -> (f32, f32) {
        let width = lines
            .iter()
            .map(|l| self.line_width(l.as_ref(), px))
            .fold(0.0, f32::max);
        (width, self.line_height(px) * lines.len() as f32)
    }

    /// Draw one line with its top-left corner at (`x`, `top`)
    pub fn draw_line(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        top: f32,
        px: f32,
        color: Rgba,
    ) {
        let Some(font) = &self.font else {
            return;
        };

        let scale = Scale::uniform(px);
        let ascent = font.v_metrics(scale).ascent;
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;
        let data = pixmap.data_mut();

        for glyph in font.layout(text, scale, point(x, top + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px_x = bb.min.x + gx as i32;
                let px_y = bb.min.y + gy as i32;
                if px_x < 0 || px_y < 0 || px_x >= width || px_y >= height {
                    return;
                }
                let offset = ((px_y * width + px_x) * 4) as usize;
                blend(&mut data[offset..offset + 4], color, coverage);
            });
        }
    }
}

/// Source-over blend of `color` at `coverage` into one premultiplied RGBA pixel
fn blend(dst: &mut [u8], color: Rgba, coverage: f32) {
    let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32 / 255.0).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let keep = 1.0 - alpha;
    let src = [color.r, color.g, color.b];
    for (channel, value) in src.iter().enumerate() {
        let out = *value as f32 * alpha + dst[channel] as f32 * keep;
        dst[channel] = out.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (255.0 * alpha + dst[3] as f32 * keep).round().clamp(0.0, 255.0) as u8;
}

fn load_system_font() -> Option<Font<'static>> {
    let mut db = Database::new();
    db.load_system_fonts();
    debug!("Font database loaded {} faces", db.len());

    for family in [Family::Monospace, Family::SansSerif] {
        let families = [family];
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let Some(id) = db.query(&query) else {
            continue;
        };
        let font = db
            .with_face_data(id, |data, index| {
                Font::try_from_vec_and_index(data.to_vec(), index)
            })
            .flatten();
        if font.is_some() {
            return font;
        }
    }

    None
}
