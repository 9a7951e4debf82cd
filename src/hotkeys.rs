//! Global hotkey management
//!
//! Provides global keyboard shortcuts for starting captures.
//! Hotkeys work even when the app is in the background.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Initialize global hotkeys for the application
///
/// Currently registered hotkeys:
/// - Control + Shift + 4: Interactive region capture (drag to select)
/// - Control + Shift + 5: Minimized-window capture (centered default region)
pub(crate) fn init_hotkeys() -> Result<GlobalHotKeyManager, String> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| format!("Failed to create hotkey manager: {}", e))?;

    let region_hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Digit4);
    manager
        .register(region_hotkey)
        .map_err(|e| format!("Failed to register region capture hotkey: {}", e))?;
    info!("Registered global hotkey: Control + Shift + 4 (region capture)");

    let minimized_hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Digit5);
    manager
        .register(minimized_hotkey)
        .map_err(|e| format!("Failed to register minimized capture hotkey: {}", e))?;
    info!("Registered global hotkey: Control + Shift + 5 (minimized capture)");

    Ok(manager)
}

/// Get the hotkey ID for region capture (Control + Shift + 4)
fn region_capture_hotkey_id() -> u32 {
    HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Digit4).id()
}

/// Get the hotkey ID for minimized capture (Control + Shift + 5)
fn minimized_capture_hotkey_id() -> u32 {
    HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Digit5).id()
}

/// Start listening for hotkey events
///
/// Spawns a dedicated background thread (not a tokio task) that polls for
/// hotkey events and invokes the matching callback. Callbacks are expected
/// to hand real work to the async runtime themselves.
pub(crate) fn start_hotkey_listener(
    on_region_capture: Arc<dyn Fn() + Send + Sync>,
    on_minimized_capture: Arc<dyn Fn() + Send + Sync>,
) {
    let region_id = region_capture_hotkey_id();
    let minimized_id = minimized_capture_hotkey_id();

    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();

        info!("Hotkey listener started on dedicated thread");

        loop {
            // Use try_recv with sleep to avoid blocking issues
            match receiver.try_recv() {
                Ok(event) => {
                    // Only handle key press, ignore key release
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    if event.id == region_id {
                        (on_region_capture)();
                    } else if event.id == minimized_id {
                        (on_minimized_capture)();
                    }
                }
                Err(_) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}
