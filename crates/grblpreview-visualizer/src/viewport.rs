//! Bounds accumulation and fit-to-panel transforms.

use grblpreview_core::CartesianQuadrant;
use tiny_skia::Transform;

/// Smallest extent used for a degenerate (zero-width or zero-height) box
const MIN_EXTENT: f64 = 1.0;

/// Bounding box accumulator used while parsing toolpaths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
        }
    }

    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.max_x.is_finite()
            && self.min_y.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn quadrant(&self) -> CartesianQuadrant {
        if !self.is_valid() {
            return CartesianQuadrant::Unknown;
        }
        CartesianQuadrant::classify(self.min_x, self.max_x, self.min_y, self.max_y)
    }

    /// Copy of these bounds stretched to contain the origin
    pub fn with_origin(mut self) -> Self {
        if self.is_valid() {
            self.update(0.0, 0.0);
        }
        self
    }

    /// Transform that fits these bounds into a `width` x `height` surface,
    /// centred, with `padding` pixels on every side and +Y pointing up.
    pub fn fit_transform(&self, width: f32, height: f32, padding: f32) -> Transform {
        let (min_x, max_x, min_y, max_y) = if self.is_valid() {
            (self.min_x, self.max_x, self.min_y, self.max_y)
        } else {
            (0.0, 100.0, 0.0, 100.0)
        };

        let span_x = (max_x - min_x).max(MIN_EXTENT);
        let span_y = (max_y - min_y).max(MIN_EXTENT);
        let avail_x = (width as f64 - 2.0 * padding as f64).max(1.0);
        let avail_y = (height as f64 - 2.0 * padding as f64).max(1.0);
        let scale = (avail_x / span_x).min(avail_y / span_y);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        let tx = width as f64 / 2.0 - center_x * scale;
        let ty = height as f64 / 2.0 + center_y * scale;

        Transform::from_row(
            scale as f32,
            0.0,
            0.0,
            -scale as f32,
            tx as f32,
            ty as f32,
        )
    }
}
