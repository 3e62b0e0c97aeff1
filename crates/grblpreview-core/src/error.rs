//! Error handling for GrblPreview
//!
//! Provides error types for the layers of the preview:
//! - Render errors (offscreen bitmap generation)
//! - Controller errors (motion-control collaborator)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Offscreen render error type
///
/// `Cancelled` is ordinary control flow: it is produced when a newer render
/// supersedes the running one, and is never reported as a failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The render was cancelled before it could publish
    #[error("Render cancelled")]
    Cancelled,

    /// The bitmap for the requested size could not be allocated
    #[error("Failed to allocate {width}x{height} preview bitmap")]
    PixmapAllocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The toolpath model failed while drawing itself
    #[error("Toolpath draw failed: {reason}")]
    DrawFailed {
        /// The reason reported by the toolpath model.
        reason: String,
    },

    /// The render worker panicked
    #[error("Render worker panicked: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl RenderError {
    /// Check if this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }
}

/// Controller error type
///
/// Represents errors returned by the motion-control collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// Controller is not connected
    #[error("Controller not connected")]
    NotConnected,

    /// Jog request was rejected by the controller
    #[error("Jog rejected: {reason}")]
    JogRejected {
        /// The reason the jog was rejected.
        reason: String,
    },

    /// Generic controller error
    #[error("Controller error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for GrblPreview
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Render error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a render cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Render(RenderError::Cancelled))
    }

    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        let err = RenderError::PixmapAllocation {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Failed to allocate 0x10 preview bitmap");
        assert_eq!(RenderError::Cancelled.to_string(), "Render cancelled");
    }

    #[test]
    fn test_cancel_is_not_failure() {
        let err: Error = RenderError::Cancelled.into();
        assert!(err.is_cancelled());

        let err: Error = RenderError::DrawFailed {
            reason: "empty".to_string(),
        }
        .into();
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_controller_error_conversion() {
        let err: Error = ControllerError::NotConnected.into();
        assert!(err.is_controller_error());
        assert_eq!(err.to_string(), "Controller not connected");
    }
}
