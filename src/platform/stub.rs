//! Fallback adapters for platforms without an overlay or window control.

use std::sync::Arc;

use tracing::warn;

use crate::geometry::{Point, Region, WindowGeometry};
use crate::selection::{OverlayError, OverlayEvents, OverlayPort};
use crate::window_control::{WindowControlError, WindowController};

pub struct StubOverlay;

impl OverlayPort for StubOverlay {
    fn show_overlay(&mut self, _events: Arc<dyn OverlayEvents>) -> Result<(), OverlayError> {
        warn!("Interactive region selection is not supported on this platform");
        Err(OverlayError::Unavailable)
    }

    fn update_crosshair(&mut self, _position: Point) {}

    fn show_selection_box(&mut self, _region: Region) {}

    fn dismiss(&mut self) {}
}

pub struct StubWindowController;

impl WindowController for StubWindowController {
    fn minimize(&self) -> Result<(), WindowControlError> {
        Err(WindowControlError::Unsupported)
    }

    fn restore(&self) -> Result<(), WindowControlError> {
        Err(WindowControlError::Unsupported)
    }

    fn focus(&self) -> Result<(), WindowControlError> {
        Err(WindowControlError::Unsupported)
    }

    fn is_minimized(&self) -> bool {
        false
    }

    // Not visible and not focused: the minimize waiter's composite signal
    // holds immediately.
    fn is_visible(&self) -> bool {
        false
    }

    fn is_focused(&self) -> bool {
        false
    }

    fn geometry(&self) -> Option<WindowGeometry> {
        None
    }
}
