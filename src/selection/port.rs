//! Presentation port for the selection overlay.
//!
//! The controller never touches a real display surface; it draws through
//! `OverlayPort` and receives input through `OverlayEvents`. Hosts plug in
//! an AppKit window, a web view, or a test recorder.

use std::sync::Arc;

use thiserror::Error;

use crate::geometry::{Point, Region};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("no overlay surface is available on this platform")]
    Unavailable,
}

/// Pointer and key input routed back from the overlay surface.
///
/// Implemented by the selection controller; platform adapters forward their
/// native events here in UI-space coordinates.
pub trait OverlayEvents: Send + Sync {
    fn pointer_down(&self, position: Point);
    fn pointer_moved(&self, position: Point);
    fn pointer_up(&self, position: Point);
    fn escape(&self);
}

/// Drawing surface the selection controller presents through.
pub trait OverlayPort: Send {
    /// Show the full-screen overlay and begin routing input to `events`.
    fn show_overlay(&mut self, events: Arc<dyn OverlayEvents>) -> Result<(), OverlayError>;

    /// Track the pointer while no drag is active (crosshair + coordinate
    /// readout).
    fn update_crosshair(&mut self, position: Point);

    /// Draw the live selection rectangle.
    fn show_selection_box(&mut self, region: Region);

    /// Remove all overlay surfaces and detach listeners. Must be idempotent.
    fn dismiss(&mut self);
}
