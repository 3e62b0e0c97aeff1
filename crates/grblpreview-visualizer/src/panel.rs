//! Machine preview panel
//!
//! Ties the renderer, poller and overlay painter to the controller, the
//! settings store and the notification bus. All methods are meant to be
//! called from the UI thread; only rendering happens elsewhere.

use crate::overlay::{OverlayPainter, OverlayState, StatusText};
use crate::poller::PositionPoller;
use crate::renderer::{PreviewRenderer, PreviewSnapshot};
use crate::transform::CoordinateTransform;
use grblpreview_core::{
    Callback, CartesianQuadrant, ColorScheme, EventBus, EventFilter, MotionController, Point,
    PointerButton, PreviewEvent, Result, SubscriptionId,
};
use grblpreview_settings::{color_scheme, PreviewConfig, SettingsStore};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tiny_skia::Pixmap;
use tracing::{debug, info};

struct PanelState {
    width: u32,
    height: u32,
    config: PreviewConfig,
    scheme: ColorScheme,
    poller: PositionPoller,
}

struct PanelInner {
    controller: Arc<dyn MotionController>,
    settings: Arc<SettingsStore>,
    renderer: PreviewRenderer,
    state: Mutex<PanelState>,
    repaint: Callback,
}

impl PanelInner {
    fn recreate(&self) {
        let (width, height, scheme) = {
            let state = self.state.lock();
            (state.width, state.height, state.scheme.clone())
        };
        self.renderer
            .request(width, height, self.controller.loaded_file(), scheme);
    }

    fn handle_event(&self, event: PreviewEvent) {
        debug!("Preview panel received: {}", event.description());
        match event {
            PreviewEvent::FileLoading { .. } => self.renderer.abort(),
            PreviewEvent::FileLoaded { .. } => self.recreate(),
            PreviewEvent::SettingsChanged => {
                let config = PreviewConfig::from_store(&self.settings);
                let force_z_changed = {
                    let mut state = self.state.lock();
                    let changed = state.config.force_z_jog_control != config.force_z_jog_control;
                    state.config = config;
                    changed
                };
                if force_z_changed {
                    (self.repaint)();
                }
            }
            PreviewEvent::ColorSchemeChanged => {
                self.state.lock().scheme = color_scheme(&self.settings);
                self.recreate();
            }
        }
    }
}

/// Live preview of the machine: toolpath bitmap, tool position and status
pub struct MachinePreviewPanel {
    inner: Arc<PanelInner>,
    bus: Arc<EventBus>,
    subscription: SubscriptionId,
    painter: OverlayPainter,
}

impl MachinePreviewPanel {
    /// Create a panel. `repaint` is called whenever the visible frame is
    /// stale, possibly from a render worker thread.
    pub fn new(
        controller: Arc<dyn MotionController>,
        settings: Arc<SettingsStore>,
        bus: Arc<EventBus>,
        repaint: Callback,
    ) -> Self {
        let config = PreviewConfig::from_store(&settings);
        let scheme = color_scheme(&settings);
        info!(
            "Creating machine preview (force Z: {}, click and jog: {})",
            config.force_z_jog_control, config.click_and_jog
        );

        let inner = Arc::new(PanelInner {
            controller,
            settings,
            renderer: PreviewRenderer::new(Some(Arc::clone(&repaint))),
            state: Mutex::new(PanelState {
                width: 0,
                height: 0,
                config,
                scheme,
                poller: PositionPoller::new(),
            }),
            repaint,
        });

        let weak: Weak<PanelInner> = Arc::downgrade(&inner);
        let subscription = bus.subscribe(EventFilter::All, move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        });

        Self {
            inner,
            bus,
            subscription,
            painter: OverlayPainter::default(),
        }
    }

    /// Replace the overlay painter (font size, text renderer)
    pub fn with_painter(mut self, painter: OverlayPainter) -> Self {
        self.painter = painter;
        self
    }

    /// New panel size in pixels; starts a fresh render
    pub fn resize(&self, width: u32, height: u32) {
        {
            let mut state = self.inner.state.lock();
            state.width = width;
            state.height = height;
        }
        self.inner.recreate();
    }

    pub fn size(&self) -> (u32, u32) {
        let state = self.inner.state.lock();
        (state.width, state.height)
    }

    /// Render the loaded toolpath again at the current size
    pub fn invalidate_preview(&self) {
        self.inner.recreate();
    }

    pub fn set_color_scheme(&self, scheme: ColorScheme) {
        self.inner.state.lock().scheme = scheme;
        self.inner.recreate();
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.inner.state.lock().scheme.clone()
    }

    pub fn config(&self) -> PreviewConfig {
        self.inner.state.lock().config
    }

    /// Poll the controller; requests one repaint and returns true if any
    /// shown value changed
    pub fn timer_update(&self) -> bool {
        let changed = self
            .inner
            .state
            .lock()
            .poller
            .tick(self.inner.controller.as_ref());
        if changed {
            (self.inner.repaint)();
        }
        changed
    }

    /// Values the overlay would show right now
    pub fn overlay_state(&self) -> OverlayState {
        let (last, feed_speed_seen) = {
            let state = self.inner.state.lock();
            (state.poller.last(), state.poller.feed_speed_seen())
        };
        let quadrant = self
            .inner
            .controller
            .loaded_file()
            .map(|file| file.quadrant())
            .unwrap_or(CartesianQuadrant::Unknown);

        OverlayState {
            machine: last.machine,
            work: last.work,
            feed: last.feed,
            speed: last.speed,
            feed_speed_seen,
            working_offset: self.inner.controller.working_offset(),
            quadrant,
        }
    }

    pub fn status_text(&self) -> StatusText {
        StatusText::compose(&self.overlay_state(), &self.config())
    }

    /// Paint the visible frame and return the status text drawn into it
    pub fn paint(&self, frame: &mut Pixmap) -> StatusText {
        let overlay = self.overlay_state();
        let (config, scheme) = {
            let state = self.inner.state.lock();
            (state.config, state.scheme.clone())
        };
        let snapshot = self.inner.renderer.snapshot();
        self.painter
            .paint(frame, snapshot.as_deref(), &overlay, &config, &scheme)
    }

    pub fn snapshot(&self) -> Option<Arc<PreviewSnapshot>> {
        self.inner.renderer.snapshot()
    }

    pub fn transform(&self) -> CoordinateTransform {
        self.inner.renderer.transform()
    }

    pub fn machine_to_draw(&self, point: Point) -> Point {
        self.transform().machine_to_draw(point)
    }

    pub fn draw_to_machine(&self, point: Point) -> Point {
        self.transform().draw_to_machine(point)
    }

    /// Jog to the clicked point when click-and-jog is enabled.
    ///
    /// Returns whether a jog was requested.
    pub fn double_click(&self, x: f32, y: f32, button: PointerButton) -> Result<bool> {
        if !self.config().click_and_jog {
            return Ok(false);
        }

        let target = self.draw_to_machine(Point::from_xy(x, y));
        debug!("Jog to ({:.3}, {:.3}) from click at ({}, {})", target.x, target.y, x, y);
        self.inner
            .controller
            .begin_jog(target, button == PointerButton::Secondary)?;
        Ok(true)
    }

    /// Block until in-flight renders have finished
    pub fn wait_for_render(&self) {
        self.inner.renderer.wait_idle();
    }
}

impl Drop for MachinePreviewPanel {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
        self.inner.renderer.abort();
    }
}
