//! Toolpath model collaborator and render cancellation.

use crate::colors::ColorScheme;
use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};

/// Coarse classification of the Cartesian region a toolpath occupies
///
/// ```text
///  II | I
/// ---------
/// III | IV
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CartesianQuadrant {
    /// Path spans several quadrants, or nothing is loaded
    #[default]
    Unknown,
    /// X >= 0, Y >= 0
    I,
    /// X <= 0, Y >= 0
    II,
    /// X <= 0, Y <= 0
    III,
    /// X >= 0, Y <= 0
    IV,
}

impl CartesianQuadrant {
    /// Classify a bounding box given as (min_x, max_x, min_y, max_y)
    pub fn classify(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite())
            || min_x > max_x
            || min_y > max_y
        {
            return Self::Unknown;
        }

        let right = min_x >= 0.0;
        let left = max_x <= 0.0;
        let top = min_y >= 0.0;
        let bottom = max_y <= 0.0;

        match (right, left, top, bottom) {
            (true, _, true, _) => Self::I,
            (_, true, true, _) => Self::II,
            (_, true, _, true) => Self::III,
            (true, _, _, true) => Self::IV,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for CartesianQuadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::I => write!(f, "I"),
            Self::II => write!(f, "II"),
            Self::III => write!(f, "III"),
            Self::IV => write!(f, "IV"),
        }
    }
}

/// Cooperative cancellation flag shared between the UI thread and a render worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(RenderError::Cancelled)` once cancelled, for use with `?` at safe points.
    pub fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A loaded toolpath that can draw itself onto an offscreen surface
pub trait ToolpathModel: Send + Sync {
    /// Draw the toolpath scaled to fit `surface` and return the machine-to-pixel
    /// transform that was used.
    ///
    /// Implementations must call `cancel.check()` periodically and bail out
    /// with `RenderError::Cancelled` without further drawing.
    fn draw_on(
        &self,
        surface: &mut Pixmap,
        scheme: &ColorScheme,
        cancel: &CancelToken,
    ) -> Result<Transform, RenderError>;

    /// Which quadrant the path occupies
    fn quadrant(&self) -> CartesianQuadrant;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quadrants() {
        assert_eq!(
            CartesianQuadrant::classify(0.0, 10.0, 0.0, 10.0),
            CartesianQuadrant::I
        );
        assert_eq!(
            CartesianQuadrant::classify(-10.0, 0.0, 1.0, 10.0),
            CartesianQuadrant::II
        );
        assert_eq!(
            CartesianQuadrant::classify(-10.0, -1.0, -10.0, 0.0),
            CartesianQuadrant::III
        );
        assert_eq!(
            CartesianQuadrant::classify(2.0, 10.0, -10.0, -2.0),
            CartesianQuadrant::IV
        );
    }

    #[test]
    fn test_classify_mixed_is_unknown() {
        assert_eq!(
            CartesianQuadrant::classify(-5.0, 5.0, 0.0, 10.0),
            CartesianQuadrant::Unknown
        );
        assert_eq!(
            CartesianQuadrant::classify(f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            CartesianQuadrant::Unknown
        );
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(worker.check().is_ok());

        token.cancel();
        assert!(worker.is_cancelled());
        assert_eq!(worker.check(), Err(RenderError::Cancelled));
    }
}
