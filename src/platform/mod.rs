//! Platform adapters: overlay presentation, window control, event loop.
//!
//! macOS gets real AppKit adapters; everything else gets stubs that report
//! the overlay and window control as unavailable. Minimized-mode capture
//! still works on stub platforms since it needs neither.

pub mod stub;

#[cfg(target_os = "macos")]
pub mod macos;

use std::sync::Arc;

use crate::selection::OverlayPort;
use crate::window_control::WindowController;

/// Fresh overlay port for the current OS.
pub fn create_overlay_port() -> Box<dyn OverlayPort> {
    #[cfg(target_os = "macos")]
    {
        return Box::new(macos::AppKitOverlay::new());
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(stub::StubOverlay)
    }
}

/// Window controller for the current OS.
pub fn create_window_controller() -> Arc<dyn WindowController> {
    #[cfg(target_os = "macos")]
    {
        return Arc::new(macos::AppKitWindowController);
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(stub::StubWindowController)
    }
}

/// Run the platform event loop. Blocks for the lifetime of the app.
pub fn run_event_loop() {
    #[cfg(target_os = "macos")]
    {
        macos::run_event_loop();
        return;
    }
    #[cfg(not(target_os = "macos"))]
    {
        // No native event loop to pump; hotkeys arrive on their own thread.
        loop {
            std::thread::park();
        }
    }
}
