//! # GrblPreview Core
//!
//! Core types, traits, and utilities for the GRBL machine preview.
//! Provides positions, error types, the collaborator traits the preview
//! consumes (motion controller, toolpath model), the colour scheme and an
//! explicitly owned notification bus.

pub mod colors;
pub mod controller;
pub mod error;
pub mod event_bus;
pub mod position;
pub mod toolpath;
pub mod types;

pub use colors::{ColorScheme, Rgba};
pub use controller::{MotionController, PointerButton};
pub use error::{ControllerError, Error, RenderError, Result};
pub use event_bus::{
    EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, PreviewEvent,
    SubscriptionId,
};
pub use position::Position;
pub use toolpath::{CancelToken, CartesianQuadrant, ToolpathModel};
pub use types::Callback;

/// 2D point in drawing or machine XY space.
pub use tiny_skia::Point;
