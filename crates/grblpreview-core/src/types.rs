//! Type aliases for commonly used complex types.

use std::sync::Arc;

/// A simple callback with no parameters or return value.
///
/// Thread-safe, suitable for cross-thread notification such as repaint requests.
pub type Callback = Arc<dyn Fn() + Send + Sync>;
