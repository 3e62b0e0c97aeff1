//! Live overlay painting
//!
//! Composes each visible frame: the cached toolpath bitmap stretched to the
//! panel, a crosshair at the current work position and a block of status
//! text placed in the corner the loaded toolpath is least likely to cover.

use crate::renderer::PreviewSnapshot;
use crate::text::TextRenderer;
use crate::transform::CoordinateTransform;
use grblpreview_core::{CartesianQuadrant, ColorScheme, Position, RenderError};
use grblpreview_settings::PreviewConfig;
use std::fmt;
use tiny_skia::{FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};
use tracing::error;

/// Half the length of a crosshair arm, in pixels
const CROSSHAIR_HALF: i32 = 5;
const CROSSHAIR_WIDTH: f32 = 2.0;
/// Distance between the panel edge and the status text
const TEXT_INSET: f32 = 5.0;
const DEFAULT_FONT_PX: f32 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    /// Left edge
    Near,
    /// Right edge
    Far,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    /// Top edge
    Near,
    /// Bottom edge
    Far,
}

/// Corner of the panel the status text is aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAnchor {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl TextAnchor {
    /// Anchor for a toolpath in `quadrant`
    ///
    /// ```text
    ///  II | I        Near/Near | Far/Near
    /// ---------     ----------------------
    /// III | IV       Near/Far  | Far/Far
    /// ```
    ///
    /// An unknown quadrant uses the top-right corner.
    pub fn for_quadrant(quadrant: CartesianQuadrant) -> Self {
        let horizontal = match quadrant {
            CartesianQuadrant::II | CartesianQuadrant::III => HorizontalAlign::Near,
            _ => HorizontalAlign::Far,
        };
        let vertical = match quadrant {
            CartesianQuadrant::III | CartesianQuadrant::IV => VerticalAlign::Far,
            _ => VerticalAlign::Near,
        };
        Self {
            horizontal,
            vertical,
        }
    }

    /// Top-left corner of a `block` sized (width, height) box aligned inside
    /// the rectangle (`left`, `top`, `right`, `bottom`)
    pub fn place(&self, rect: (f32, f32, f32, f32), block: (f32, f32)) -> (f32, f32) {
        let (left, top, right, bottom) = rect;
        let x = match self.horizontal {
            HorizontalAlign::Near => left,
            HorizontalAlign::Far => right - block.0,
        };
        let y = match self.vertical {
            VerticalAlign::Near => top,
            VerticalAlign::Far => bottom - block.1,
        };
        (x, y)
    }
}

/// Values the overlay shows, as last seen by the poller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayState {
    pub machine: Position,
    pub work: Position,
    pub feed: f32,
    pub speed: f32,
    /// Feed or speed has been nonzero at some point since the panel was created
    pub feed_speed_seen: bool,
    pub working_offset: Position,
    pub quadrant: CartesianQuadrant,
}

/// The status block drawn in the panel corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    lines: Vec<String>,
}

impl StatusText {
    pub fn compose(state: &OverlayState, config: &PreviewConfig) -> Self {
        let show_z =
            state.work.z != 0.0 || state.machine.z != 0.0 || config.force_z_jog_control;

        let mut lines = Vec::with_capacity(3);
        lines.push(coordinate_line(&state.machine, show_z));

        if !state.working_offset.is_zero() {
            lines.push(coordinate_line(&state.work, show_z));
        }

        if state.feed_speed_seen || state.feed != 0.0 || state.speed != 0.0 {
            lines.push(format!(
                "F: {} S: {}",
                pad_number(state.feed as f64, 5),
                pad_number(state.speed as f64, 3)
            ));
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn shows_z(&self) -> bool {
        self.lines.first().is_some_and(|l| l.contains(" Z: "))
    }

    pub fn shows_feed_speed(&self) -> bool {
        self.lines.last().is_some_and(|l| l.starts_with("F: "))
    }
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

fn coordinate_line(p: &Position, show_z: bool) -> String {
    let mut line = format!("X: {:.3} Y: {:.3}", p.x, p.y);
    if show_z {
        line.push_str(&format!(" Z: {:.3}", p.z));
    }
    line
}

/// `value` with at least `digits` integer digits and up to two decimals,
/// trailing zeros trimmed: 1200.5 with 5 digits is "01200.5"
fn pad_number(value: f64, digits: usize) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && rounded.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    let mut out = format!("{}{:0>width$}", sign, int_part, width = digits);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Paints the visible frame of the preview panel
#[derive(Debug, Clone, Copy)]
pub struct OverlayPainter {
    text: &'static TextRenderer,
    font_px: f32,
}

impl Default for OverlayPainter {
    fn default() -> Self {
        Self::new(TextRenderer::global())
    }
}

impl OverlayPainter {
    pub fn new(text: &'static TextRenderer) -> Self {
        Self {
            text,
            font_px: DEFAULT_FONT_PX,
        }
    }

    pub fn with_font_size(mut self, px: f32) -> Self {
        self.font_px = px;
        self
    }

    /// Draw one frame and return the status text shown in it.
    ///
    /// Drawing failures are logged and leave the frame partially drawn.
    pub fn paint(
        &self,
        frame: &mut Pixmap,
        snapshot: Option<&PreviewSnapshot>,
        state: &OverlayState,
        config: &PreviewConfig,
        scheme: &ColorScheme,
    ) -> StatusText {
        frame.fill(scheme.preview_back.to_color());

        if let Some(snapshot) = snapshot {
            draw_stretched(frame, snapshot);
        }

        let transform = snapshot
            .map(|s| s.transform())
            .unwrap_or_else(CoordinateTransform::none);
        if let Err(e) = draw_crosshair(frame, &transform, &state.work, scheme) {
            error!(component = "Preview Paint", "Failed to draw crosshair: {}", e);
        }

        let status = StatusText::compose(state, config);
        self.draw_status(frame, &status, TextAnchor::for_quadrant(state.quadrant), scheme);
        status
    }

    fn draw_status(
        &self,
        frame: &mut Pixmap,
        status: &StatusText,
        anchor: TextAnchor,
        scheme: &ColorScheme,
    ) {
        let rect = (
            TEXT_INSET,
            TEXT_INSET,
            frame.width() as f32 - TEXT_INSET,
            frame.height() as f32 - TEXT_INSET,
        );
        let line_height = self.text.line_height(self.font_px);
        let block = self.text.measure(status.lines(), self.font_px);
        let (_, top) = anchor.place(rect, block);

        for (i, line) in status.lines().iter().enumerate() {
            let width = self.text.line_width(line, self.font_px);
            let (x, _) = anchor.place(rect, (width, block.1));
            let y = top + i as f32 * line_height;
            self.text
                .draw_line(frame, line, x, y, self.font_px, scheme.preview_text);
        }
    }
}

fn draw_stretched(frame: &mut Pixmap, snapshot: &PreviewSnapshot) {
    let sx = frame.width() as f32 / snapshot.width() as f32;
    let sy = frame.height() as f32 / snapshot.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    frame.draw_pixmap(
        0,
        0,
        snapshot.pixmap().as_ref(),
        &paint,
        Transform::from_scale(sx, sy),
        None,
    );
}

fn draw_crosshair(
    frame: &mut Pixmap,
    transform: &CoordinateTransform,
    work: &Position,
    scheme: &ColorScheme,
) -> Result<(), RenderError> {
    let point = transform.machine_to_draw(work.to_point());
    if !point.x.is_finite() || !point.y.is_finite() {
        return Err(RenderError::DrawFailed {
            reason: format!("work position maps to ({}, {})", point.x, point.y),
        });
    }

    // Pixel-snapped like the rest of the overlay
    let (x, y) = (point.x as i32, point.y as i32);
    let mut pb = PathBuilder::new();
    pb.move_to(x as f32, (y - CROSSHAIR_HALF) as f32);
    pb.line_to(x as f32, (y + CROSSHAIR_HALF) as f32);
    pb.move_to((x - CROSSHAIR_HALF) as f32, y as f32);
    pb.line_to((x + CROSSHAIR_HALF) as f32, y as f32);
    let path = pb.finish().ok_or_else(|| RenderError::DrawFailed {
        reason: "empty crosshair path".to_string(),
    })?;

    let mut paint = Paint::default();
    paint.set_color(scheme.preview_cross.to_color());
    paint.anti_alias = true;
    let stroke = Stroke {
        width: CROSSHAIR_WIDTH,
        ..Default::default()
    };
    frame.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    Ok(())
}
