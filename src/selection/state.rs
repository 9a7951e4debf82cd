//! Drag state and single-shot settlement for region selection.

use tokio::sync::oneshot;
use tracing::warn;

use crate::geometry::{Point, Region};

/// Pointer progression across the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DragState {
    /// Overlay shown, button up; the crosshair follows the pointer.
    Idle,
    /// Button held since `anchor`; the live rectangle spans anchor to
    /// pointer.
    Dragging { anchor: Point },
}

/// Single-shot completion of the pending selection.
///
/// The selection future resolves at most once; settling twice is a
/// programming error, asserted in debug builds and dropped with a warning in
/// release builds.
pub(super) struct Settlement {
    sender: Option<oneshot::Sender<Option<Region>>>,
}

impl Settlement {
    pub(super) fn new() -> (Self, oneshot::Receiver<Option<Region>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    pub(super) fn is_settled(&self) -> bool {
        self.sender.is_none()
    }

    pub(super) fn settle(&mut self, result: Option<Region>) {
        match self.sender.take() {
            // The receiver may already be gone during forced teardown.
            Some(sender) => {
                let _ = sender.send(result);
            }
            None => {
                debug_assert!(false, "selection settled twice");
                warn!("Ignoring duplicate selection settlement");
            }
        }
    }
}
