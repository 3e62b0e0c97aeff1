//! G-code toolpath model
//!
//! Parses the motion subset of G-code needed for a preview (G0/G1/G2/G3 with
//! X/Y/I/J words, G90/G91) and draws it onto an offscreen surface.

use crate::transform::CoordinateTransform;
use crate::viewport::Bounds;
use grblpreview_core::{
    CancelToken, CartesianQuadrant, ColorScheme, Point, RenderError, ToolpathModel,
};
use std::f64::consts::PI;
use tiny_skia::{LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, trace};

/// Pixels kept free around the drawn path
const PREVIEW_PADDING_PX: f32 = 20.0;
/// Segments drawn between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 256;
/// Maximum angle covered by one chord when flattening arcs
const ARC_STEP_RAD: f64 = PI / 36.0;

/// A single move of the toolpath, in machine XY
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        rapid: bool,
    },
    Arc {
        from: (f64, f64),
        to: (f64, f64),
        center: (f64, f64),
        clockwise: bool,
    },
}

impl PathSegment {
    fn from_point(&self) -> (f64, f64) {
        match self {
            PathSegment::Line { from, .. } | PathSegment::Arc { from, .. } => *from,
        }
    }

    /// Points along the segment after `from`, with arcs flattened to chords
    fn flatten(&self) -> Vec<(f64, f64)> {
        match *self {
            PathSegment::Line { to, .. } => vec![to],
            PathSegment::Arc {
                from,
                to,
                center,
                clockwise,
            } => flatten_arc(from, to, center, clockwise),
        }
    }
}

fn flatten_arc(
    from: (f64, f64),
    to: (f64, f64),
    center: (f64, f64),
    clockwise: bool,
) -> Vec<(f64, f64)> {
    let radius = (from.0 - center.0).hypot(from.1 - center.1);
    if !radius.is_finite() || radius < 1e-6 {
        return vec![to];
    }

    let start = (from.1 - center.1).atan2(from.0 - center.0);
    let end = (to.1 - center.1).atan2(to.0 - center.0);
    let mut sweep = if clockwise { start - end } else { end - start };
    while sweep <= 0.0 {
        sweep += 2.0 * PI;
    }

    let steps = ((sweep / ARC_STEP_RAD).ceil() as usize).max(1);
    let direction = if clockwise { -1.0 } else { 1.0 };
    let mut points = Vec::with_capacity(steps);
    for i in 1..steps {
        let angle = start + direction * sweep * (i as f64 / steps as f64);
        points.push((
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
        ));
    }
    points.push(to);
    points
}

/// Parsed toolpath ready for preview rendering
#[derive(Debug, Clone, Default)]
pub struct GcodeToolpath {
    segments: Vec<PathSegment>,
    bounds: Bounds,
}

impl GcodeToolpath {
    /// Parse G-code text. Unknown words and malformed numbers are skipped.
    pub fn parse(gcode: &str) -> Self {
        debug!("Starting G-code parse, input size: {} bytes", gcode.len());

        let mut segments = Vec::new();
        let mut bounds = Bounds::new();
        let mut pos = (0.0_f64, 0.0_f64);
        let mut motion: Option<u32> = None;
        let mut relative = false;

        for (line_num, raw) in gcode.lines().enumerate() {
            let line = strip_comments(raw);
            if line.is_empty() {
                continue;
            }

            let mut x = None;
            let mut y = None;
            let mut i = None;
            let mut j = None;

            for word in words(&line) {
                let (letter, value) = word;
                match letter {
                    // G90.1/G91.1 only select the arc centre mode
                    'G' if value.fract() == 0.0 => match value as u32 {
                        code @ 0..=3 => motion = Some(code),
                        90 => relative = false,
                        91 => relative = true,
                        _ => {}
                    },
                    'X' => x = Some(value),
                    'Y' => y = Some(value),
                    'I' => i = Some(value),
                    'J' => j = Some(value),
                    _ => {}
                }
            }

            if x.is_none() && y.is_none() {
                continue;
            }
            let Some(code) = motion else {
                trace!("Line {}: coordinates without motion mode", line_num);
                continue;
            };

            let target = if relative {
                (pos.0 + x.unwrap_or(0.0), pos.1 + y.unwrap_or(0.0))
            } else {
                (x.unwrap_or(pos.0), y.unwrap_or(pos.1))
            };

            let segment = match code {
                0 | 1 => PathSegment::Line {
                    from: pos,
                    to: target,
                    rapid: code == 0,
                },
                _ => PathSegment::Arc {
                    from: pos,
                    to: target,
                    center: (pos.0 + i.unwrap_or(0.0), pos.1 + j.unwrap_or(0.0)),
                    clockwise: code == 2,
                },
            };

            bounds.update(pos.0, pos.1);
            for (px, py) in segment.flatten() {
                bounds.update(px, py);
            }
            segments.push(segment);
            pos = target;
        }

        debug!("Parsed {} toolpath segments", segments.len());
        Self { segments, bounds }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn strip_comments(line: &str) -> String {
    let line = line.split(';').next().unwrap_or("");
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c.to_ascii_uppercase()),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Split a comment-free line into (letter, value) words; "G1X10Y-2.5" and
/// "G1 X10 Y-2.5" give the same words.
fn words(line: &str) -> Vec<(char, f64)> {
    let mut result = Vec::new();
    let mut chars = line.chars().filter(|c| !c.is_whitespace()).peekable();

    while let Some(letter) = chars.next() {
        if !letter.is_ascii_alphabetic() {
            continue;
        }
        let mut number = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
                number.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if let Ok(value) = number.parse::<f64>() {
            result.push((letter, value));
        }
    }

    result
}

impl ToolpathModel for GcodeToolpath {
    fn draw_on(
        &self,
        surface: &mut Pixmap,
        scheme: &ColorScheme,
        cancel: &CancelToken,
    ) -> Result<Transform, RenderError> {
        let matrix = self.bounds.with_origin().fit_transform(
            surface.width() as f32,
            surface.height() as f32,
            PREVIEW_PADDING_PX,
        );
        let transform = CoordinateTransform::new(matrix);
        let to_px =
            |(x, y): (f64, f64)| transform.machine_to_draw(Point::from_xy(x as f32, y as f32));

        let mut cuts = PathBuilder::new();
        let mut rapids = PathBuilder::new();
        let mut last_cut: Option<(f64, f64)> = None;

        for (index, segment) in self.segments.iter().enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }

            let from = segment.from_point();
            match segment {
                PathSegment::Line {
                    to, rapid: true, ..
                } => {
                    let (a, b) = (to_px(from), to_px(*to));
                    rapids.move_to(a.x, a.y);
                    rapids.line_to(b.x, b.y);
                    last_cut = None;
                }
                _ => {
                    if last_cut != Some(from) {
                        let a = to_px(from);
                        cuts.move_to(a.x, a.y);
                    }
                    let mut end = from;
                    for point in segment.flatten() {
                        let p = to_px(point);
                        cuts.line_to(p.x, p.y);
                        end = point;
                    }
                    last_cut = Some(end);
                }
            }
        }

        cancel.check()?;

        let origin = to_px((0.0, 0.0));
        let mut axes = PathBuilder::new();
        axes.move_to(origin.x - 6.0, origin.y);
        axes.line_to(origin.x + 6.0, origin.y);
        axes.move_to(origin.x, origin.y - 6.0);
        axes.line_to(origin.x, origin.y + 6.0);

        stroke(surface, rapids, scheme.preview_rapid.to_color(), 1.0);
        stroke(surface, axes, scheme.preview_rapid.to_color(), 1.0);
        stroke(surface, cuts, scheme.preview_path.to_color(), 1.5);

        Ok(matrix)
    }

    fn quadrant(&self) -> CartesianQuadrant {
        self.bounds.quadrant()
    }
}

fn stroke(surface: &mut Pixmap, builder: PathBuilder, color: tiny_skia::Color, width: f32) {
    let Some(path) = builder.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        ..Default::default()
    };
    surface.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}
