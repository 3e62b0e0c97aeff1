//! Offscreen preview rendering
//!
//! Each request draws the loaded toolpath into a fresh pixmap on a named
//! worker thread. A newer request cancels every older one, and a worker only
//! publishes its result if it is still the latest request when it finishes.
//! The pixmap and the transform it was drawn with are published together as
//! one [`PreviewSnapshot`], so readers never see a bitmap paired with the
//! transform of a different render.

use crate::transform::CoordinateTransform;
use grblpreview_core::{Callback, CancelToken, ColorScheme, RenderError, ToolpathModel};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_skia::{Pixmap, Transform};
use tracing::{debug, error, warn};

/// Name given to every render worker thread
pub const RENDER_THREAD_NAME: &str = "GrblPanel Drawing Thread";

/// A finished render: the bitmap and the transform it was drawn with
#[derive(Debug)]
pub struct PreviewSnapshot {
    pixmap: Pixmap,
    transform: CoordinateTransform,
    generation: u64,
}

impl PreviewSnapshot {
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn transform(&self) -> CoordinateTransform {
        self.transform
    }

    /// Request number that produced this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

struct Shared {
    snapshot: Mutex<Option<Arc<PreviewSnapshot>>>,
    generation: AtomicU64,
    repaint: Option<Callback>,
}

struct RenderJob {
    handle: JoinHandle<()>,
    cancel: CancelToken,
}

/// Background renderer owning the current preview snapshot
pub struct PreviewRenderer {
    shared: Arc<Shared>,
    jobs: Mutex<Vec<RenderJob>>,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PreviewRenderer {
    /// Create a renderer. `repaint` is invoked from the worker thread after
    /// each successful publication.
    pub fn new(repaint: Option<Callback>) -> Self {
        Self {
            shared: Arc::new(Shared {
                snapshot: Mutex::new(None),
                generation: AtomicU64::new(0),
                repaint,
            }),
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Latest published snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<PreviewSnapshot>> {
        self.shared.snapshot.lock().clone()
    }

    /// Transform of the latest published snapshot
    pub fn transform(&self) -> CoordinateTransform {
        self.snapshot()
            .map(|s| s.transform())
            .unwrap_or_default()
    }

    /// Number of requests made so far
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Start rendering `model` at `width` x `height`, superseding any
    /// render in flight. Zero-sized requests only cancel.
    pub fn request(
        &self,
        width: u32,
        height: u32,
        model: Option<Arc<dyn ToolpathModel>>,
        scheme: ColorScheme,
    ) {
        let mut jobs = self.jobs.lock();
        for job in jobs.iter() {
            job.cancel.cancel();
        }
        jobs.retain(|job| !job.handle.is_finished());

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if width == 0 || height == 0 {
            debug!("Skipping preview render for empty panel {}x{}", width, height);
            return;
        }

        let cancel = CancelToken::new();
        let shared = Arc::clone(&self.shared);
        let token = cancel.clone();

        let spawned = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                run_render(&shared, generation, width, height, model, &scheme, &token)
            });

        match spawned {
            Ok(handle) => jobs.push(RenderJob { handle, cancel }),
            Err(e) => error!(
                component = "Drawing Preview",
                "Failed to start render thread: {}", e
            ),
        }
    }

    /// Cancel every render in flight. The published snapshot is kept.
    pub fn abort(&self) {
        for job in self.jobs.lock().iter() {
            job.cancel.cancel();
        }
    }

    /// Block until every worker started so far has exited
    pub fn wait_idle(&self) {
        let jobs: Vec<RenderJob> = std::mem::take(&mut *self.jobs.lock());
        for job in jobs {
            if job.handle.join().is_err() {
                warn!("Render thread exited abnormally");
            }
        }
    }

    /// True while any worker is still running
    pub fn is_busy(&self) -> bool {
        self.jobs.lock().iter().any(|job| !job.handle.is_finished())
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        self.abort();
    }
}

fn run_render(
    shared: &Shared,
    generation: u64,
    width: u32,
    height: u32,
    model: Option<Arc<dyn ToolpathModel>>,
    scheme: &ColorScheme,
    cancel: &CancelToken,
) {
    match draw(width, height, model.as_deref(), scheme, cancel) {
        Ok((pixmap, matrix)) => {
            let snapshot = Arc::new(PreviewSnapshot {
                pixmap,
                transform: CoordinateTransform::new(matrix),
                generation,
            });

            let previous = {
                let mut slot = shared.snapshot.lock();
                if cancel.is_cancelled() || shared.generation.load(Ordering::SeqCst) != generation {
                    debug!("Discarding superseded preview render #{}", generation);
                    return;
                }
                slot.replace(snapshot)
            };
            drop(previous);

            debug!("Published preview render #{} ({}x{})", generation, width, height);
            if let Some(repaint) = &shared.repaint {
                repaint();
            }
        }
        Err(RenderError::Cancelled) => {
            debug!("Preview render #{} cancelled", generation);
        }
        Err(e) => {
            error!(component = "Drawing Preview", "Preview render failed: {}", e);
        }
    }
}

fn draw(
    width: u32,
    height: u32,
    model: Option<&dyn ToolpathModel>,
    scheme: &ColorScheme,
    cancel: &CancelToken,
) -> Result<(Pixmap, Transform), RenderError> {
    cancel.check()?;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(RenderError::PixmapAllocation { width, height })?;

    let matrix = match model {
        Some(model) => panic::catch_unwind(AssertUnwindSafe(|| {
            model.draw_on(&mut pixmap, scheme, cancel)
        }))
        .map_err(|payload| RenderError::Panicked {
            message: panic_message(payload.as_ref()),
        })??,
        None => Transform::identity(),
    };

    cancel.check()?;
    Ok((pixmap, matrix))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
