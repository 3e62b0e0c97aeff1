//! Machine <-> drawing coordinate conversion.
//!
//! The transform is produced as a side effect of rendering the loaded
//! toolpath. Before the first render there is no transform and both
//! directions are the identity.

use grblpreview_core::Point;
use tiny_skia::Transform;

/// Affine map from machine XY to panel pixels, as used by the last render
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateTransform {
    matrix: Option<Transform>,
}

impl CoordinateTransform {
    /// No transform yet: both directions return the point unchanged
    pub fn none() -> Self {
        Self { matrix: None }
    }

    pub fn new(matrix: Transform) -> Self {
        Self {
            matrix: Some(matrix),
        }
    }

    pub fn matrix(&self) -> Option<Transform> {
        self.matrix
    }

    pub fn is_invertible(&self) -> bool {
        self.matrix.as_ref().and_then(invert).is_some()
    }

    /// Machine coordinates to panel pixels
    pub fn machine_to_draw(&self, point: Point) -> Point {
        match self.matrix {
            Some(m) => apply(&Affine::from(&m), point),
            None => point,
        }
    }

    /// Panel pixels to machine coordinates.
    ///
    /// Falls back to the identity when there is no transform or it cannot be
    /// inverted.
    pub fn draw_to_machine(&self, point: Point) -> Point {
        match self.matrix.as_ref().and_then(invert) {
            Some(inverse) => apply(&inverse, point),
            None => point,
        }
    }
}

/// Row-major affine matrix in f64 so round trips keep their precision.
#[derive(Debug, Clone, Copy)]
struct Affine {
    sx: f64,
    kx: f64,
    tx: f64,
    ky: f64,
    sy: f64,
    ty: f64,
}

impl From<&Transform> for Affine {
    fn from(m: &Transform) -> Self {
        Self {
            sx: m.sx as f64,
            kx: m.kx as f64,
            tx: m.tx as f64,
            ky: m.ky as f64,
            sy: m.sy as f64,
            ty: m.ty as f64,
        }
    }
}

fn invert(m: &Transform) -> Option<Affine> {
    let a = Affine::from(m);
    let det = a.sx * a.sy - a.kx * a.ky;
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    let inverse = Affine {
        sx: a.sy / det,
        kx: -a.kx / det,
        tx: (a.kx * a.ty - a.sy * a.tx) / det,
        ky: -a.ky / det,
        sy: a.sx / det,
        ty: (a.ky * a.tx - a.sx * a.ty) / det,
    };

    [
        inverse.sx, inverse.kx, inverse.tx, inverse.ky, inverse.sy, inverse.ty,
    ]
    .iter()
    .all(|v| v.is_finite())
    .then_some(inverse)
}

fn apply(m: &Affine, p: Point) -> Point {
    let (x, y) = (p.x as f64, p.y as f64);
    Point::from_xy(
        (m.sx * x + m.kx * y + m.tx) as f32,
        (m.ky * x + m.sy * y + m.ty) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let t = CoordinateTransform::none();
        let p = Point::from_xy(12.0, -4.0);
        assert_eq!(t.machine_to_draw(p), p);
        assert_eq!(t.draw_to_machine(p), p);
        assert!(!t.is_invertible());
    }

    #[test]
    fn test_scale_translate_flip() {
        // 2 px/mm, Y up, origin at (10, 290)
        let t = CoordinateTransform::new(Transform::from_row(2.0, 0.0, 0.0, -2.0, 10.0, 290.0));
        let drawn = t.machine_to_draw(Point::from_xy(5.0, 5.0));
        assert_eq!(drawn, Point::from_xy(20.0, 280.0));

        let back = t.draw_to_machine(drawn);
        assert!((back.x - 5.0).abs() < 1e-4);
        assert!((back.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_singular_inverse_is_identity() {
        let t = CoordinateTransform::new(Transform::from_scale(0.0, 3.0));
        assert!(!t.is_invertible());

        let p = Point::from_xy(7.0, 8.0);
        assert_eq!(t.draw_to_machine(p), p);
        assert_eq!(t.machine_to_draw(p), Point::from_xy(0.0, 24.0));
    }
}
