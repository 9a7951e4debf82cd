//! Window control contract and the minimize waiter.
//!
//! Minimizing the host window before a capture keeps it out of the shot.
//! No cross-platform completion event exists for "minimize finished", so the
//! waiter polls a composite signal with a bounded attempt count.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::geometry::WindowGeometry;
use crate::poll::poll_until;

/// Interval between minimize-state polls.
pub(crate) const MINIMIZE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum polls before giving up on observing the minimize.
pub(crate) const MINIMIZE_POLL_ATTEMPTS: u32 = 50;

#[derive(Debug, Error)]
pub enum WindowControlError {
    #[error("window control is not available on this platform")]
    Unsupported,

    #[error("no controllable window")]
    NoWindow,
}

/// Control surface for the host application window.
pub trait WindowController: Send + Sync {
    fn minimize(&self) -> Result<(), WindowControlError>;
    fn restore(&self) -> Result<(), WindowControlError>;
    fn focus(&self) -> Result<(), WindowControlError>;
    fn is_minimized(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn is_focused(&self) -> bool;
    /// Outer/inner bounds and screen position, when a window exists.
    fn geometry(&self) -> Option<WindowGeometry>;
}

/// Wait until `controller` reports the window gone from the foreground.
///
/// The composite signal is: minimized, or neither visible nor focused.
/// Resolves `true` as soon as the signal holds, `false` after the attempt
/// bound (~500 ms); callers proceed either way since minimize completion is
/// advisory.
pub(crate) async fn wait_for_minimize(controller: &dyn WindowController) -> bool {
    let observed = poll_until(
        || {
            controller.is_minimized() || (!controller.is_visible() && !controller.is_focused())
        },
        tokio::time::sleep,
        MINIMIZE_POLL_INTERVAL,
        MINIMIZE_POLL_ATTEMPTS,
    )
    .await;

    if observed {
        debug!("Window minimize observed");
    } else {
        debug!("Window minimize not observed within the poll bound");
    }
    observed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct FakeWindow {
        polls: AtomicU32,
        minimized_after: u32,
        minimized: AtomicBool,
        visible: AtomicBool,
        focused: AtomicBool,
    }

    impl FakeWindow {
        fn new(minimized_after: u32) -> Self {
            Self {
                polls: AtomicU32::new(0),
                minimized_after,
                minimized: AtomicBool::new(false),
                visible: AtomicBool::new(true),
                focused: AtomicBool::new(true),
            }
        }
    }

    impl WindowController for FakeWindow {
        fn minimize(&self) -> Result<(), WindowControlError> {
            Ok(())
        }

        fn restore(&self) -> Result<(), WindowControlError> {
            self.minimized.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn focus(&self) -> Result<(), WindowControlError> {
            self.focused.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_minimized(&self) -> bool {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst);
            if polls >= self.minimized_after {
                self.minimized.store(true, Ordering::SeqCst);
            }
            self.minimized.load(Ordering::SeqCst)
        }

        fn is_visible(&self) -> bool {
            self.visible.load(Ordering::SeqCst)
        }

        fn is_focused(&self) -> bool {
            self.focused.load(Ordering::SeqCst)
        }

        fn geometry(&self) -> Option<WindowGeometry> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_when_minimize_observed() {
        let window = FakeWindow::new(3);
        assert!(wait_for_minimize(&window).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_within_bound_when_never_minimized() {
        // Signal never fires: still resolves after the attempt bound.
        let window = FakeWindow::new(u32::MAX);
        assert!(!wait_for_minimize(&window).await);
        assert_eq!(window.polls.load(Ordering::SeqCst), MINIMIZE_POLL_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_unfocused_window_counts_as_minimized() {
        let window = FakeWindow::new(u32::MAX);
        window.visible.store(false, Ordering::SeqCst);
        window.focused.store(false, Ordering::SeqCst);
        assert!(wait_for_minimize(&window).await);
    }
}
