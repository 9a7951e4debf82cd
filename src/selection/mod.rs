//! Interactive region selection over a full-screen overlay.
//!
//! The controller is a pointer-interaction state machine: Idle (crosshair
//! tracking) becomes Dragging on pointer-down, the live rectangle follows
//! the pointer, and pointer-up resolves the selection. Escape cancels at any
//! point. Drags below the minimum size resolve as "no selection".
//!
//! Presentation is behind [`OverlayPort`], so the machine runs against any
//! host UI, including the test recorder in this module's tests.

mod port;
mod state;

pub use port::{OverlayError, OverlayEvents, OverlayPort};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::geometry::{Point, Region};

use state::{DragState, Settlement};

/// Drives one selection interaction from overlay show to settlement.
pub struct SelectionController {
    inner: Mutex<Inner>,
}

struct Inner {
    port: Box<dyn OverlayPort>,
    drag: DragState,
    settlement: Settlement,
    receiver: Option<oneshot::Receiver<Option<Region>>>,
    dismissed: bool,
}

impl SelectionController {
    pub fn new(port: Box<dyn OverlayPort>) -> Arc<Self> {
        let (settlement, receiver) = Settlement::new();
        Arc::new(Self {
            inner: Mutex::new(Inner {
                port,
                drag: DragState::Idle,
                settlement,
                receiver: Some(receiver),
                dismissed: false,
            }),
        })
    }

    /// Show the overlay and begin routing input back into this controller.
    pub fn present(self: &Arc<Self>) -> Result<(), OverlayError> {
        let events: Arc<dyn OverlayEvents> = self.clone();
        let mut inner = self.lock();
        debug!("Presenting selection overlay");
        inner.port.show_overlay(events)
    }

    /// Await the user's selection.
    ///
    /// `None` means the user cancelled or the drag was too small. Resolves
    /// at most once; a second call returns `None` immediately.
    pub async fn wait_for_selection(&self) -> Option<Region> {
        let receiver = self.lock().receiver.take();
        let Some(receiver) = receiver else {
            warn!("wait_for_selection called more than once");
            return None;
        };
        receiver.await.unwrap_or(None)
    }

    /// Tear down the overlay surface and listeners.
    ///
    /// Idempotent; every session exit path runs through here. A selection
    /// still pending is settled with `None` first so no waiter is left
    /// hanging.
    pub fn dismiss(&self) {
        let mut inner = self.lock();
        if !inner.settlement.is_settled() {
            inner.settlement.settle(None);
        }
        if inner.dismissed {
            return;
        }
        inner.dismissed = true;
        inner.port.dismiss();
        debug!("Selection overlay dismissed");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl OverlayEvents for SelectionController {
    fn pointer_down(&self, position: Point) {
        let mut inner = self.lock();
        if inner.settlement.is_settled() {
            return;
        }
        inner.drag = DragState::Dragging { anchor: position };
    }

    fn pointer_moved(&self, position: Point) {
        let mut inner = self.lock();
        if inner.settlement.is_settled() {
            return;
        }
        match inner.drag {
            DragState::Idle => inner.port.update_crosshair(position),
            DragState::Dragging { anchor } => {
                let live = Region::from_corners(anchor, position);
                inner.port.show_selection_box(live);
            }
        }
    }

    fn pointer_up(&self, position: Point) {
        let mut inner = self.lock();
        if inner.settlement.is_settled() {
            return;
        }
        let DragState::Dragging { anchor } = inner.drag else {
            return;
        };
        inner.drag = DragState::Idle;

        let region = Region::from_corners(anchor, position);
        if region.is_valid_selection() {
            info!(
                "Region selected: {}x{} at ({},{})",
                region.width, region.height, region.x, region.y
            );
            inner.settlement.settle(Some(region));
        } else {
            debug!(
                "Selection too small ({}x{}), treating as no selection",
                region.width, region.height
            );
            inner.settlement.settle(None);
        }
    }

    fn escape(&self) {
        let mut inner = self.lock();
        if inner.settlement.is_settled() {
            debug!("Escape after settlement ignored");
            return;
        }
        info!("Selection cancelled");
        inner.settlement.settle(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct PortLog {
        shown: AtomicU32,
        dismissed: AtomicU32,
        crosshairs: Mutex<Vec<Point>>,
        boxes: Mutex<Vec<Region>>,
    }

    struct RecordingPort {
        log: Arc<PortLog>,
    }

    impl OverlayPort for RecordingPort {
        fn show_overlay(&mut self, _events: Arc<dyn OverlayEvents>) -> Result<(), OverlayError> {
            self.log.shown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn update_crosshair(&mut self, position: Point) {
            self.log.crosshairs.lock().unwrap().push(position);
        }

        fn show_selection_box(&mut self, region: Region) {
            self.log.boxes.lock().unwrap().push(region);
        }

        fn dismiss(&mut self) {
            self.log.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller() -> (Arc<SelectionController>, Arc<PortLog>) {
        let log = Arc::new(PortLog::default());
        let port = RecordingPort { log: log.clone() };
        let controller = SelectionController::new(Box::new(port));
        controller.present().unwrap();
        (controller, log)
    }

    #[tokio::test]
    async fn test_drag_resolves_normalized_region() {
        let (controller, _log) = controller();

        controller.pointer_down(Point { x: 100, y: 50 });
        controller.pointer_moved(Point { x: 300, y: 200 });
        controller.pointer_up(Point { x: 300, y: 200 });

        let region = controller.wait_for_selection().await.unwrap();
        assert_eq!(
            region,
            Region {
                x: 100,
                y: 50,
                width: 200,
                height: 150
            }
        );
    }

    #[tokio::test]
    async fn test_reverse_drag_resolves_identical_region() {
        let (controller, _log) = controller();

        controller.pointer_down(Point { x: 300, y: 200 });
        controller.pointer_up(Point { x: 100, y: 50 });

        let region = controller.wait_for_selection().await.unwrap();
        assert_eq!(
            region,
            Region {
                x: 100,
                y: 50,
                width: 200,
                height: 150
            }
        );
    }

    #[tokio::test]
    async fn test_tiny_drag_resolves_none() {
        let (controller, _log) = controller();

        controller.pointer_down(Point { x: 10, y: 10 });
        controller.pointer_up(Point { x: 15, y: 15 });

        assert!(controller.wait_for_selection().await.is_none());
    }

    #[tokio::test]
    async fn test_escape_cancels_exactly_once() {
        let (controller, _log) = controller();

        controller.pointer_down(Point { x: 10, y: 10 });
        controller.escape();
        // Settled already: these must all be no-ops.
        controller.escape();
        controller.pointer_up(Point { x: 500, y: 500 });

        assert!(controller.wait_for_selection().await.is_none());
    }

    #[tokio::test]
    async fn test_crosshair_tracks_only_while_idle() {
        let (controller, log) = controller();

        controller.pointer_moved(Point { x: 5, y: 6 });
        controller.pointer_down(Point { x: 10, y: 10 });
        controller.pointer_moved(Point { x: 40, y: 50 });

        assert_eq!(log.crosshairs.lock().unwrap().as_slice(), &[Point { x: 5, y: 6 }]);
        assert_eq!(
            log.boxes.lock().unwrap().as_slice(),
            &[Region {
                x: 10,
                y: 10,
                width: 30,
                height: 40
            }]
        );
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent_and_settles_pending() {
        let (controller, log) = controller();

        controller.dismiss();
        controller.dismiss();

        assert_eq!(log.dismissed.load(Ordering::SeqCst), 1);
        assert!(controller.wait_for_selection().await.is_none());
    }

    #[tokio::test]
    async fn test_pointer_input_ignored_after_dismiss() {
        let (controller, log) = controller();

        controller.dismiss();
        controller.pointer_moved(Point { x: 1, y: 1 });
        controller.pointer_down(Point { x: 1, y: 1 });
        controller.pointer_moved(Point { x: 90, y: 90 });

        assert!(log.crosshairs.lock().unwrap().is_empty());
        assert!(log.boxes.lock().unwrap().is_empty());
    }
}
