//! # Event Bus Module
//!
//! Notification channel between the controller/application shell and the
//! preview panel. The bus is created by the application and handed to each
//! consumer at construction; there is no global instance.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grblpreview_core::event_bus::{EventBus, EventCategory, EventFilter, PreviewEvent};
//!
//! let bus = std::sync::Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::File]),
//!     |event| println!("file event: {}", event.description()),
//! );
//!
//! bus.publish(PreviewEvent::FileLoaded {
//!     elapsed_ms: 12,
//!     filename: "logo.nc".to_string(),
//! })
//! .ok();
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
