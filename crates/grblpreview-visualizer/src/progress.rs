//! Segmented progress bar, used for file loading and streaming progress.

use crate::text::TextRenderer;
use grblpreview_core::Rgba;
use thiserror::Error;
use tiny_skia::{
    Color, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, Rect, SpreadMode,
    Stroke, Transform,
};
use tracing::warn;

/// Width of one dashed segment
const SEGMENT_WIDTH: i32 = 6;
/// Gap between dashed segments
const SEGMENT_GAP: i32 = 2;
const MIN_WIDTH: u32 = 20;
const MIN_HEIGHT: u32 = 6;
const TEXT_PX: f32 = 11.0;

const DISABLED_FILL: Rgba = Rgba::opaque(169, 169, 169);
const DISABLED_BAR: Rgba = Rgba::opaque(211, 211, 211);
const BORDER_SHADOW: Rgba = Rgba::opaque(211, 211, 211);

/// Bar shading from top to bottom: (position, weight of the bar colour)
const BAR_BLEND: [(f32, f32); 5] = [(0.0, 0.1), (0.2, 1.0), (0.5, 1.0), (0.8, 0.85), (1.0, 0.1)];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgressError {
    #[error("'{value}' is not a valid value: must be between {minimum} and {maximum}")]
    OutOfRange {
        value: f64,
        minimum: f64,
        maximum: f64,
    },

    #[error("Invalid range: minimum {minimum} must be smaller than maximum {maximum}")]
    InvalidRange { minimum: f64, maximum: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillStyle {
    Solid,
    #[default]
    Dashed,
}

#[derive(Debug, Clone)]
pub struct ProgressBar {
    value: f64,
    minimum: f64,
    maximum: f64,
    /// Amount added by [`ProgressBar::perform_step`]
    pub step: f64,
    pub fill_style: FillStyle,
    /// Grow from the right edge
    pub reverse: bool,
    pub draw_progress_string: bool,
    pub progress_decimals: usize,
    /// Reject out-of-range values instead of clamping them
    pub strict: bool,
    pub enabled: bool,
    pub fill_color: Rgba,
    pub bar_color: Rgba,
    pub border_color: Rgba,
    pub text_color: Rgba,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            value: 0.0,
            minimum: 0.0,
            maximum: 100.0,
            step: 10.0,
            fill_style: FillStyle::default(),
            reverse: false,
            draw_progress_string: false,
            progress_decimals: 0,
            strict: false,
            enabled: true,
            fill_color: Rgba::opaque(255, 255, 255),
            bar_color: Rgba::opaque(255, 128, 128),
            border_color: Rgba::opaque(128, 128, 128),
            text_color: Rgba::opaque(0, 0, 0),
        }
    }
}

impl ProgressBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    fn out_of_range(&self, value: f64) -> ProgressError {
        ProgressError::OutOfRange {
            value,
            minimum: self.minimum,
            maximum: self.maximum,
        }
    }

    pub fn set_value(&mut self, value: f64) -> Result<(), ProgressError> {
        if value < self.minimum || value > self.maximum || value.is_nan() {
            if self.strict {
                return Err(self.out_of_range(value));
            }
            if value.is_nan() {
                return Ok(());
            }
        }
        self.value = value.clamp(self.minimum, self.maximum);
        Ok(())
    }

    /// Lower bound; the current value is raised to it if needed
    pub fn set_minimum(&mut self, minimum: f64) -> Result<(), ProgressError> {
        if minimum >= self.maximum {
            if self.strict {
                return Err(ProgressError::InvalidRange {
                    minimum,
                    maximum: self.maximum,
                });
            }
            warn!("Progress minimum {} is not below maximum {}", minimum, self.maximum);
        }
        self.value = self.value.max(minimum);
        self.minimum = minimum;
        Ok(())
    }

    /// Upper bound; the current value is lowered to it if needed
    pub fn set_maximum(&mut self, maximum: f64) -> Result<(), ProgressError> {
        if maximum <= self.minimum {
            if self.strict {
                return Err(ProgressError::InvalidRange {
                    minimum: self.minimum,
                    maximum,
                });
            }
            warn!("Progress maximum {} is not above minimum {}", maximum, self.minimum);
        }
        self.value = self.value.min(maximum);
        self.maximum = maximum;
        Ok(())
    }

    pub fn perform_step(&mut self) {
        self.increment(self.step);
    }

    pub fn perform_step_back(&mut self) {
        self.decrement(self.step);
    }

    pub fn increment(&mut self, amount: f64) {
        self.value = if self.value < self.maximum {
            (self.value + amount).min(self.maximum)
        } else {
            self.maximum
        };
    }

    pub fn decrement(&mut self, amount: f64) {
        self.value = if self.value > self.minimum {
            (self.value - amount).max(self.minimum)
        } else {
            self.minimum
        };
    }

    /// Position of the value within the range, or None for an empty range
    pub fn fraction(&self) -> Option<f64> {
        let span = self.maximum - self.minimum;
        let fraction = (self.value - self.minimum) / span;
        (span != 0.0 && fraction.is_finite()).then_some(fraction)
    }

    /// Percentage text such as "42%"; empty for an empty range
    pub fn progress_string(&self) -> String {
        match self.fraction() {
            Some(f) => format!("{:.*}%", self.progress_decimals, f * 100.0),
            None => String::new(),
        }
    }

    /// Width the bar snaps to so dashed segments end cleanly
    pub fn snapped_size(&self, width: u32, height: u32) -> (u32, u32) {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);
        match self.fill_style {
            FillStyle::Dashed => ((width / 8) * 8 + 1, height),
            FillStyle::Solid => (width, height),
        }
    }

    /// Width of the filled part in pixels for a bar `width` pixels wide
    pub fn bar_width(&self, width: u32) -> u32 {
        let span = self.maximum - self.minimum;
        if !self.value.is_finite() || span == 0.0 || width < 3 {
            return 0;
        }
        let filled = ((width - 3) as f64 * (self.value.min(self.maximum) - self.minimum)) / span;
        filled.floor().max(0.0) as u32
    }

    pub fn paint(&self, pixmap: &mut Pixmap) {
        let (w, h) = (pixmap.width() as i32, pixmap.height() as i32);
        if w < 4 || h < 4 {
            return;
        }

        let (fill, bar) = if self.enabled {
            (self.fill_color, self.bar_color)
        } else {
            (DISABLED_FILL, DISABLED_BAR)
        };

        self.draw_background(pixmap, fill);
        self.draw_bar(pixmap, fill, bar);
        if self.fill_style == FillStyle::Dashed {
            draw_ticks(pixmap, fill);
        }
        if self.draw_progress_string {
            self.draw_text(pixmap);
        }
        self.draw_border(pixmap);
    }

    fn draw_background(&self, pixmap: &mut Pixmap, fill: Rgba) {
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        let outline = [
            (1.0, 2.0),
            (2.0, 1.0),
            (3.0, 0.0),
            (w - 3.0, 0.0),
            (w - 2.0, 1.0),
            (w - 1.0, 2.0),
            (w - 1.0, h - 3.0),
            (w - 2.0, h - 2.0),
            (w - 3.0, h - 1.0),
            (3.0, h - 1.0),
            (2.0, h - 2.0),
            (1.0, h - 3.0),
        ];
        let Some(path) = polygon(&outline, true) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(fill.to_color());
        pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn draw_bar(&self, pixmap: &mut Pixmap, fill: Rgba, bar: Rgba) {
        let (w, h) = (pixmap.width(), pixmap.height());
        let bar_width = self.bar_width(w) as f32;
        let bar_height = h as f32 - 4.0;
        if bar_width <= 0.0 || bar_height <= 0.0 {
            return;
        }

        let left = if self.reverse {
            w as f32 - bar_width - 1.0
        } else {
            2.0
        };
        let Some(rect) = Rect::from_xywh(left, 2.0, bar_width, bar_height) else {
            return;
        };

        let stops = BAR_BLEND
            .iter()
            .map(|&(pos, weight)| GradientStop::new(pos, mix(fill, bar, weight)))
            .collect();
        let mut paint = Paint::default();
        match LinearGradient::new(
            Point::from_xy(0.0, 2.0),
            Point::from_xy(0.0, 2.0 + bar_height),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ) {
            Some(shader) => paint.shader = shader,
            None => paint.set_color(bar.to_color()),
        }
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn draw_text(&self, pixmap: &mut Pixmap) {
        let text = self.progress_string();
        if text.is_empty() {
            return;
        }
        let renderer = TextRenderer::global();
        let (tw, th) = renderer.measure(&[text.as_str()], TEXT_PX);
        let x = ((pixmap.width() as f32 - tw) / 2.0).round();
        let y = ((pixmap.height() as f32 - th) / 2.0).round();
        renderer.draw_line(pixmap, &text, x, y, TEXT_PX, self.text_color);
    }

    fn draw_border(&self, pixmap: &mut Pixmap) {
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        let border = [
            (0.5, 2.5),
            (2.5, 0.5),
            (w - 2.5, 0.5),
            (w - 0.5, 2.5),
            (w - 0.5, h - 2.5),
            (w - 2.5, h - 0.5),
            (2.5, h - 0.5),
            (0.5, h - 2.5),
        ];
        let shadow = [(1.5, h - 2.5), (1.5, 2.5), (2.5, 1.5), (w - 2.5, 1.5)];

        stroke_polyline(pixmap, &border, true, self.border_color);
        stroke_polyline(pixmap, &shadow, false, BORDER_SHADOW);
    }
}

fn draw_ticks(pixmap: &mut Pixmap, fill: Rgba) {
    let (w, h) = (pixmap.width() as i32, pixmap.height() as f32);
    let mut pb = PathBuilder::new();
    let mut x = SEGMENT_WIDTH + 3;
    while x < w {
        pb.move_to(x as f32, 0.0);
        pb.line_to(x as f32, h);
        x += SEGMENT_WIDTH + SEGMENT_GAP;
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(fill.to_color());
    let stroke = Stroke {
        width: SEGMENT_GAP as f32,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

fn polygon(points: &[(f32, f32)], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn stroke_polyline(pixmap: &mut Pixmap, points: &[(f32, f32)], close: bool, color: Rgba) {
    let Some(path) = polygon(points, close) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_color());
    paint.anti_alias = false;
    pixmap.stroke_path(&path, &paint, &Stroke::default(), Transform::identity(), None);
}

/// Interpolate from `from` to `to` by `t`
fn mix(from: Rgba, to: Rgba, t: f32) -> Color {
    let lerp = |a: u8, b: u8| {
        (a as f32 + (b as f32 - a as f32) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::from_rgba8(
        lerp(from.r, to.r),
        lerp(from.g, to.g),
        lerp(from.b, to.b),
        lerp(from.a, to.a),
    )
}
