//! Capture session orchestration.
//!
//! One end-to-end request: optionally minimize the host window, acquire a
//! region (interactive overlay or the synthesized minimized-mode default),
//! grab a full-screen bitmap, map the region into bitmap space, cut the
//! margin-extended crop, and hand everything to the editor sink.
//!
//! At most one session runs at a time. The permit is taken synchronously
//! before the first await and released by RAII on every exit path, so a
//! second request while one is underway is a clean no-op and an error can
//! never leave capturing locked out.

mod coords;
mod extend;
mod source;

pub use coords::map_to_screen_space;
pub use extend::{extend_rect, extended_crop, DEFAULT_EXTEND_FACTOR};
pub use source::{MonitorSource, ScreenCaptureSource, SourceError, SourceFrame};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::error::CaptureError;
use crate::geometry::{PhysicalRect, Region, WindowGeometry};
use crate::notify::NotificationSink;
use crate::selection::{OverlayPort, SelectionController};
use crate::window_control::{wait_for_minimize, WindowController};

/// Delay before capturing so the OS finishes compositing after a minimize.
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Fraction of the screen covered by the synthesized minimized-mode region.
const DEFAULT_REGION_FRACTION: f64 = 0.6;

/// Progression of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Minimizing,
    Selecting,
    Capturing,
    Cropping,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    fn is_active(self) -> bool {
        self != Self::Idle && !self.is_terminal()
    }
}

/// Owner of the single "capture in progress" slot.
struct SessionGate {
    state: Mutex<SessionState>,
}

impl SessionGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// Check-and-set under one lock: a permit is granted only when no
    /// session is active, and the gate leaves `Idle` before the caller can
    /// reach an await point.
    fn acquire(self: &Arc<Self>, initial: SessionState) -> Option<SessionPermit> {
        let mut state = self.lock();
        if state.is_active() {
            return None;
        }
        *state = initial;
        drop(state);
        Some(SessionPermit { gate: self.clone() })
    }

    fn current(&self) -> SessionState {
        *self.lock()
    }

    fn set(&self, state: SessionState) {
        debug!("Session state -> {:?}", state);
        *self.lock() = state;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// RAII hold on the capture slot; dropping returns the gate to `Idle`.
struct SessionPermit {
    gate: Arc<SessionGate>,
}

impl SessionPermit {
    fn set(&self, state: SessionState) {
        self.gate.set(state);
    }
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.gate.set(SessionState::Idle);
    }
}

/// Everything the downstream editor needs for one captured region.
pub struct EditorHandoff {
    /// The margin-extended crop.
    pub image: DynamicImage,
    /// The user's selection in bitmap coordinates.
    pub region: PhysicalRect,
    /// The extended rectangle `image` was cut at.
    pub extended: PhysicalRect,
    /// The untouched full-screen capture.
    pub full: DynamicImage,
}

/// Consumer of finished captures (annotation editor, exporter, ...).
pub trait EditorSink: Send + Sync {
    fn open_editor(&self, handoff: EditorHandoff) -> anyhow::Result<()>;
}

/// Produces a fresh overlay surface for each interactive session.
pub type OverlayFactory = Box<dyn Fn() -> Box<dyn OverlayPort> + Send + Sync>;

/// The capture pipeline: collaborators plus the session gate.
pub struct CapturePipeline {
    gate: Arc<SessionGate>,
    window: Arc<dyn WindowController>,
    source: Arc<dyn ScreenCaptureSource>,
    notifier: Arc<dyn NotificationSink>,
    editor: Arc<dyn EditorSink>,
    overlay_factory: OverlayFactory,
    active_selection: Mutex<Option<Arc<SelectionController>>>,
    extend_factor: f64,
    runtime: tokio::runtime::Handle,
}

impl CapturePipeline {
    /// Must be called from within the tokio runtime that will own the
    /// sessions; the handle is captured for fire-and-forget requests coming
    /// in from foreign threads (hotkey listener).
    pub fn new(
        window: Arc<dyn WindowController>,
        source: Arc<dyn ScreenCaptureSource>,
        notifier: Arc<dyn NotificationSink>,
        editor: Arc<dyn EditorSink>,
        overlay_factory: OverlayFactory,
        extend_factor: f64,
    ) -> Arc<Self> {
        Arc::new(Self {
            gate: Arc::new(SessionGate::new()),
            window,
            source,
            notifier,
            editor,
            overlay_factory,
            active_selection: Mutex::new(None),
            extend_factor,
            runtime: tokio::runtime::Handle::current(),
        })
    }

    /// Fire-and-forget capture request; callable from any thread.
    pub fn start_region_capture(self: &Arc<Self>, minimize_window: bool) {
        let pipeline = self.clone();
        self.runtime.spawn(async move {
            pipeline.run(minimize_window).await;
        });
    }

    /// One end-to-end capture session; every outcome is handled here.
    pub async fn run(&self, minimize_window: bool) {
        let initial = if minimize_window {
            SessionState::Minimizing
        } else {
            SessionState::Selecting
        };
        let Some(permit) = self.gate.acquire(initial) else {
            debug!("Capture already in progress, ignoring request");
            return;
        };

        match self.run_session(&permit, minimize_window).await {
            Ok(()) => {
                permit.set(SessionState::Completed);
            }
            Err(CaptureError::SelectionCancelled) => {
                // Overlay cleanup has already run by the time we get here.
                permit.set(SessionState::Cancelled);
                self.notifier.notify("Region capture cancelled");
            }
            Err(err) => {
                permit.set(SessionState::Failed);
                error!("Capture session failed: {}", err);
                self.restore_window();
                self.notifier.notify(&format!("Screen capture failed: {}", err));
            }
        }
        // The permit drops here, returning the gate to Idle.
    }

    async fn run_session(
        &self,
        permit: &SessionPermit,
        minimize_window: bool,
    ) -> Result<(), CaptureError> {
        let region = if minimize_window {
            self.minimize_and_wait().await;
            let screen = self
                .source
                .screen_size()
                .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;
            let region = Region::centered(screen, DEFAULT_REGION_FRACTION);
            info!(
                "Minimized capture, default region {}x{} at ({},{})",
                region.width, region.height, region.x, region.y
            );
            region
        } else {
            permit.set(SessionState::Selecting);
            self.select_region().await?
        };

        permit.set(SessionState::Capturing);
        let capture_source = self.source.clone();
        let full =
            tokio::task::spawn_blocking(move || source::capture_full_screen(&*capture_source))
                .await
                .map_err(|e| CaptureError::Unknown(e.to_string()))??;

        if minimize_window {
            // Fire-and-forget: the crop work below must not wait on the
            // OS restore animation.
            self.restore_window();
        }

        permit.set(SessionState::Cropping);
        let screen = self
            .source
            .screen_size()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;
        let window = self
            .window
            .geometry()
            .unwrap_or_else(|| WindowGeometry::covering(screen));

        let physical =
            coords::map_to_screen_space(region, &window, screen, full.width(), full.height());
        let (extended, image) = extend::extended_crop(&full, physical, self.extend_factor);

        self.editor
            .open_editor(EditorHandoff {
                image,
                region: physical,
                extended,
                full,
            })
            .map_err(|e| CaptureError::Unknown(e.to_string()))?;

        info!("Capture session completed");
        Ok(())
    }

    /// Ask the window to minimize and give the OS a bounded chance to
    /// finish. Minimize is advisory: failure or a missed signal only delays
    /// the capture, never aborts it.
    async fn minimize_and_wait(&self) {
        if let Err(e) = self.window.minimize() {
            warn!("Window minimize failed ({}), continuing after a short delay", e);
            tokio::time::sleep(SETTLE_DELAY).await;
            return;
        }

        wait_for_minimize(&*self.window).await;
        tokio::time::sleep(SETTLE_DELAY).await;
    }

    async fn select_region(&self) -> Result<Region, CaptureError> {
        let controller = SelectionController::new((self.overlay_factory)());
        *self.active_lock() = Some(controller.clone());

        if let Err(e) = controller.present() {
            controller.dismiss();
            self.active_lock().take();
            return Err(CaptureError::Unknown(format!("overlay unavailable: {}", e)));
        }

        let region = controller.wait_for_selection().await;

        // Cleanup always runs before the outcome is acted on.
        controller.dismiss();
        self.active_lock().take();

        region.ok_or(CaptureError::SelectionCancelled)
    }

    fn restore_window(&self) {
        if let Err(e) = self.window.restore() {
            warn!("Window restore failed: {}", e);
        }
        if let Err(e) = self.window.focus() {
            warn!("Window focus failed: {}", e);
        }
    }

    /// Current session state, `Idle` when nothing is underway.
    #[allow(dead_code)]
    pub fn session_state(&self) -> SessionState {
        self.gate.current()
    }

    /// Force teardown of any active overlay state.
    ///
    /// Safe to call at any time, including when idle. A pending selection
    /// settles as cancelled, which unwinds the owning session through its
    /// normal cleanup path.
    pub fn cleanup(&self) {
        if let Some(controller) = self.active_lock().take() {
            info!("Forcing selection overlay teardown");
            controller.dismiss();
        }
    }

    fn active_lock(&self) -> MutexGuard<'_, Option<Arc<SelectionController>>> {
        self.active_selection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
