//! AppKit adapters: selection overlay window and host window control.
//!
//! The overlay is a borderless full-screen window above normal content with
//! a custom view forwarding mouse input into the selection controller, and a
//! local key monitor for Escape. AppKit uses bottom-left-origin coordinates;
//! everything crossing into the core is flipped to top-left UI space.

use std::sync::{Arc, Mutex};

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{declare_class, msg_send, msg_send_id, mutability, ClassType, DeclaredClass};
use objc2_app_kit::{
    NSApplication, NSBackingStoreType, NSColor, NSScreen, NSView, NSWindow, NSWindowStyleMask,
};
use objc2_foundation::{
    MainThreadMarker, NSObjectProtocol, NSOperationQueue, NSPoint, NSRect, NSSize, NSString,
};
use once_cell::sync::Lazy;
use tracing::{debug, error, info, warn};

use crate::geometry::{Point, Region, ScreenGeometry, WindowGeometry};
use crate::selection::{OverlayError, OverlayEvents, OverlayPort};
use crate::window_control::{WindowControlError, WindowController};

/// Window level above normal content so the overlay sits on top.
const OVERLAY_WINDOW_LEVEL: isize = 1001;

/// ESC key code on macOS keyboards.
const ESCAPE_KEYCODE: u16 = 53;

/// Global state for the active overlay window.
static OVERLAY_STATE: Lazy<Mutex<Option<OverlayState>>> = Lazy::new(|| Mutex::new(None));

struct OverlayState {
    window: Retained<NSWindow>,
    events: Arc<dyn OverlayEvents>,
    event_monitor: Option<Retained<AnyObject>>,
    screen_height: f64,
    crosshair: Option<Point>,
    selection: Option<Region>,
}

// SAFETY: OverlayState is only mutated from the main thread; the Retained
// window is created and released there via MainThreadMarker-gated paths.
unsafe impl Send for OverlayState {}

/// `OverlayPort` backed by an AppKit overlay window.
pub struct AppKitOverlay;

impl AppKitOverlay {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AppKitOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayPort for AppKitOverlay {
    fn show_overlay(&mut self, events: Arc<dyn OverlayEvents>) -> Result<(), OverlayError> {
        debug!("Presenting AppKit selection overlay");

        if let Some(mtm) = MainThreadMarker::new() {
            show_on_main_thread(mtm, events);
            return Ok(());
        }

        let block = RcBlock::new(move || {
            if let Some(mtm) = MainThreadMarker::new() {
                show_on_main_thread(mtm, events.clone());
            }
        });
        unsafe {
            let queue = NSOperationQueue::mainQueue();
            let _: () = msg_send![&queue, addOperationWithBlock: &*block];
        }
        Ok(())
    }

    fn update_crosshair(&mut self, position: Point) {
        if let Ok(mut guard) = OVERLAY_STATE.lock() {
            if let Some(state) = guard.as_mut() {
                state.crosshair = Some(position);
                state.selection = None;
            }
        }
        request_redraw();
    }

    fn show_selection_box(&mut self, region: Region) {
        if let Ok(mut guard) = OVERLAY_STATE.lock() {
            if let Some(state) = guard.as_mut() {
                state.selection = Some(region);
            }
        }
        request_redraw();
    }

    fn dismiss(&mut self) {
        if let Some(mtm) = MainThreadMarker::new() {
            teardown_on_main_thread(mtm);
            return;
        }

        let block = RcBlock::new(|| {
            if let Some(mtm) = MainThreadMarker::new() {
                teardown_on_main_thread(mtm);
            }
        });
        unsafe {
            let queue = NSOperationQueue::mainQueue();
            let _: () = msg_send![&queue, addOperationWithBlock: &*block];
        }
    }
}

/// Internal: create and register the overlay on the main thread.
fn show_on_main_thread(mtm: MainThreadMarker, events: Arc<dyn OverlayEvents>) {
    if OVERLAY_STATE.lock().map(|g| g.is_some()).unwrap_or(false) {
        debug!("Overlay already active, ignoring");
        return;
    }

    let Some(screen) = NSScreen::mainScreen(mtm) else {
        error!("No main screen found for overlay");
        return;
    };
    let frame = screen.frame();
    let screen_height = frame.origin.y + frame.size.height;

    let window = create_overlay_window(mtm, frame);
    let event_monitor = install_key_monitor();

    let state = OverlayState {
        window,
        events,
        event_monitor,
        screen_height,
        crosshair: None,
        selection: None,
    };
    if let Ok(mut guard) = OVERLAY_STATE.lock() {
        *guard = Some(state);
    }

    info!("Selection overlay active - drag to select, ESC to cancel");
}

/// Create the borderless full-screen overlay window.
fn create_overlay_window(mtm: MainThreadMarker, frame: NSRect) -> Retained<NSWindow> {
    let window = unsafe {
        NSWindow::initWithContentRect_styleMask_backing_defer(
            mtm.alloc(),
            frame,
            NSWindowStyleMask::Borderless,
            NSBackingStoreType::NSBackingStoreBuffered,
            false,
        )
    };

    unsafe { window.setReleasedWhenClosed(false) };
    window.setOpaque(false);
    window.setLevel(OVERLAY_WINDOW_LEVEL);

    // Semi-transparent dark backdrop
    let bg_color = unsafe { NSColor::colorWithRed_green_blue_alpha(0.0, 0.0, 0.0, 0.3) };
    window.setBackgroundColor(Some(&bg_color));

    unsafe {
        let _: () = msg_send![&window, setIgnoresMouseEvents: false];
        let _: () = msg_send![&window, setAcceptsMouseMovedEvents: true];
    }

    let view_frame = NSRect::new(NSPoint::new(0.0, 0.0), frame.size);
    let view = OverlayView::new(mtm, view_frame);
    window.setContentView(Some(&view));
    window.makeKeyAndOrderFront(None);
    unsafe {
        let _: bool = msg_send![&window, makeFirstResponder: &*view];
    }

    window
}

/// Install the local key monitor that turns ESC into a cancellation.
fn install_key_monitor() -> Option<Retained<AnyObject>> {
    // NSEventMaskKeyDown
    let mask: u64 = 1 << 10;

    let block = RcBlock::new(|event: *mut AnyObject| -> *mut AnyObject {
        if event.is_null() {
            return event;
        }

        let keycode: u16 = unsafe { msg_send![event, keyCode] };
        if keycode == ESCAPE_KEYCODE {
            debug!("ESC pressed on overlay");
            if let Some(events) = current_events() {
                events.escape();
            }
            return std::ptr::null_mut(); // Consume event
        }

        event // Pass through other events
    });

    unsafe {
        let ns_event_class = objc2::runtime::AnyClass::get("NSEvent")?;
        msg_send_id![
            ns_event_class,
            addLocalMonitorForEventsMatchingMask: mask
            handler: &*block
        ]
    }
}

/// Internal: tear down the overlay on the main thread. Idempotent.
fn teardown_on_main_thread(mtm: MainThreadMarker) {
    if let Ok(mut guard) = OVERLAY_STATE.lock() {
        if let Some(mut state) = guard.take() {
            if let Some(monitor) = state.event_monitor.take() {
                unsafe {
                    if let Some(ns_event_class) = objc2::runtime::AnyClass::get("NSEvent") {
                        let _: () = msg_send![ns_event_class, removeMonitor: &*monitor];
                    }
                }
            }
            // orderOut immediately removes the window (no animation)
            state.window.orderOut(None);
            state.window.close();
            debug!("Overlay window closed");
        }
    }

    close_stray_overlays(mtm);
}

/// Defensive sweep: close anything still sitting at the overlay level, in
/// case an earlier teardown only partially completed.
fn close_stray_overlays(mtm: MainThreadMarker) {
    let app = NSApplication::sharedApplication(mtm);
    for window in app.windows().iter() {
        if window.level() == OVERLAY_WINDOW_LEVEL {
            warn!("Closing stray overlay window");
            window.orderOut(None);
            window.close();
        }
    }
}

fn current_events() -> Option<Arc<dyn OverlayEvents>> {
    let guard = OVERLAY_STATE.lock().ok()?;
    guard.as_ref().map(|state| state.events.clone())
}

fn overlay_screen_height() -> Option<f64> {
    let guard = OVERLAY_STATE.lock().ok()?;
    guard.as_ref().map(|state| state.screen_height)
}

fn forward_event<F: FnOnce(&dyn OverlayEvents)>(f: F) {
    if let Some(events) = current_events() {
        f(&*events);
    }
}

/// Request redraw of the overlay content view.
fn request_redraw() {
    if let Ok(guard) = OVERLAY_STATE.lock() {
        if let Some(state) = guard.as_ref() {
            if let Some(content_view) = state.window.contentView() {
                unsafe {
                    let _: () = msg_send![&content_view, setNeedsDisplay: true];
                }
            }
        }
    }
}

/// Pointer location of `event` in top-left-origin UI space.
fn ui_location(view: &OverlayView, event: *mut AnyObject) -> Option<Point> {
    if event.is_null() {
        return None;
    }

    let location: NSPoint = unsafe { msg_send![event, locationInWindow] };
    let window: *mut AnyObject = unsafe { msg_send![view, window] };
    if window.is_null() {
        return None;
    }
    let screen_location: NSPoint = unsafe { msg_send![window, convertPointToScreen: location] };

    let screen_height = overlay_screen_height()?;
    Some(Point {
        x: screen_location.x.round() as i32,
        y: (screen_height - screen_location.y).round() as i32,
    })
}

fn ui_point_to_cocoa(point: Point, screen_height: f64) -> NSPoint {
    NSPoint::new(point.x as f64, screen_height - point.y as f64)
}

fn ui_region_to_cocoa(region: Region, screen_height: f64) -> NSRect {
    NSRect::new(
        NSPoint::new(
            region.x as f64,
            screen_height - (region.y as f64 + region.height as f64),
        ),
        NSSize::new(region.width as f64, region.height as f64),
    )
}

// Custom NSView forwarding mouse events and drawing the selection feedback
declare_class!(
    pub struct OverlayView;

    unsafe impl ClassType for OverlayView {
        type Super = NSView;
        type Mutability = mutability::MainThreadOnly;
        const NAME: &'static str = "SniplineOverlayView";
    }

    impl DeclaredClass for OverlayView {}

    unsafe impl OverlayView {
        #[method(mouseDown:)]
        fn mouse_down(&self, event: *mut AnyObject) {
            if let Some(position) = ui_location(self, event) {
                forward_event(|events| events.pointer_down(position));
            }
        }

        #[method(mouseDragged:)]
        fn mouse_dragged(&self, event: *mut AnyObject) {
            if let Some(position) = ui_location(self, event) {
                forward_event(|events| events.pointer_moved(position));
            }
        }

        #[method(mouseMoved:)]
        fn mouse_moved(&self, event: *mut AnyObject) {
            if let Some(position) = ui_location(self, event) {
                forward_event(|events| events.pointer_moved(position));
            }
        }

        #[method(mouseUp:)]
        fn mouse_up(&self, event: *mut AnyObject) {
            if let Some(position) = ui_location(self, event) {
                forward_event(|events| events.pointer_up(position));
            }
        }

        #[method(drawRect:)]
        fn draw_rect(&self, _dirty_rect: NSRect) {
            let snapshot = {
                let Ok(guard) = OVERLAY_STATE.lock() else { return };
                let Some(state) = guard.as_ref() else { return };
                (state.crosshair, state.selection, state.screen_height)
            };
            let (crosshair, selection, screen_height) = snapshot;

            if let Some(region) = selection {
                let rect = ui_region_to_cocoa(region, screen_height);

                unsafe {
                    // Selection fill (light blue) and border (blue)
                    let fill_color = NSColor::colorWithRed_green_blue_alpha(0.0, 0.5, 1.0, 0.15);
                    fill_color.set();

                    let bezier_class =
                        objc2::runtime::AnyClass::get("NSBezierPath").expect("NSBezierPath exists");
                    let path: *mut AnyObject = msg_send![bezier_class, bezierPathWithRect: rect];
                    let _: () = msg_send![path, fill];

                    let stroke_color = NSColor::colorWithRed_green_blue_alpha(0.0, 0.5, 1.0, 1.0);
                    stroke_color.set();

                    let _: () = msg_send![path, setLineWidth: 2.0f64];
                    let _: () = msg_send![path, stroke];
                }
            } else if let Some(pointer) = crosshair {
                let bounds: NSRect = unsafe { msg_send![self, bounds] };
                let cocoa = ui_point_to_cocoa(pointer, screen_height);

                unsafe {
                    let line_color = NSColor::colorWithRed_green_blue_alpha(1.0, 1.0, 1.0, 0.6);
                    line_color.set();

                    let bezier_class =
                        objc2::runtime::AnyClass::get("NSBezierPath").expect("NSBezierPath exists");
                    let path: *mut AnyObject = msg_send![bezier_class, bezierPath];
                    let _: () = msg_send![path, setLineWidth: 1.0f64];
                    let _: () = msg_send![path, moveToPoint: NSPoint::new(cocoa.x, 0.0)];
                    let _: () = msg_send![path, lineToPoint: NSPoint::new(cocoa.x, bounds.size.height)];
                    let _: () = msg_send![path, moveToPoint: NSPoint::new(0.0, cocoa.y)];
                    let _: () = msg_send![path, lineToPoint: NSPoint::new(bounds.size.width, cocoa.y)];
                    let _: () = msg_send![path, stroke];

                    // Coordinate readout near the pointer
                    let label = NSString::from_str(&format!("{}, {}", pointer.x, pointer.y));
                    let text_point = NSPoint::new(cocoa.x + 8.0, cocoa.y + 8.0);
                    let nil_attrs: *mut AnyObject = std::ptr::null_mut();
                    let _: () = msg_send![&*label, drawAtPoint: text_point withAttributes: nil_attrs];
                }
            }
        }

        #[method(acceptsFirstMouse:)]
        fn accepts_first_mouse(&self, _event: *mut AnyObject) -> bool {
            true
        }

        #[method(acceptsFirstResponder)]
        fn accepts_first_responder(&self) -> bool {
            true
        }
    }

    unsafe impl NSObjectProtocol for OverlayView {}
);

impl OverlayView {
    fn new(mtm: MainThreadMarker, frame: NSRect) -> Retained<Self> {
        let alloc = mtm.alloc::<Self>();
        unsafe { msg_send_id![alloc, initWithFrame: frame] }
    }
}

/// Host window control via AppKit.
///
/// Operates on the app's main window, skipping overlay windows. Every call
/// hops to the main thread; reads block on a sync dispatch.
pub struct AppKitWindowController;

impl AppKitWindowController {
    /// Run `f` against the first app window that is not the overlay.
    fn with_host_window<F, R>(&self, default: R, f: F) -> R
    where
        F: FnOnce(&NSWindow, MainThreadMarker) -> R + Send,
        R: Send,
    {
        on_main(move |mtm| {
            let app = NSApplication::sharedApplication(mtm);
            let windows = app.windows();
            for window in windows.iter() {
                if window.level() != OVERLAY_WINDOW_LEVEL {
                    return f(window, mtm);
                }
            }
            default
        })
    }
}

impl WindowController for AppKitWindowController {
    fn minimize(&self) -> Result<(), WindowControlError> {
        self.with_host_window(Err(WindowControlError::NoWindow), |window, _| {
            unsafe {
                let _: () = msg_send![window, miniaturize: std::ptr::null::<AnyObject>()];
            }
            Ok(())
        })
    }

    fn restore(&self) -> Result<(), WindowControlError> {
        self.with_host_window(Err(WindowControlError::NoWindow), |window, _| {
            unsafe {
                let _: () = msg_send![window, deminiaturize: std::ptr::null::<AnyObject>()];
            }
            Ok(())
        })
    }

    fn focus(&self) -> Result<(), WindowControlError> {
        self.with_host_window(Err(WindowControlError::NoWindow), |window, _| {
            window.makeKeyAndOrderFront(None);
            Ok(())
        })
    }

    fn is_minimized(&self) -> bool {
        self.with_host_window(false, |window, _| window.isMiniaturized())
    }

    fn is_visible(&self) -> bool {
        self.with_host_window(false, |window, _| window.isVisible())
    }

    fn is_focused(&self) -> bool {
        self.with_host_window(false, |window, _| window.isKeyWindow())
    }

    fn geometry(&self) -> Option<WindowGeometry> {
        self.with_host_window(None, |window, mtm| {
            let screen = screen_geometry(mtm)?;
            let frame = window.frame();
            let content: NSRect = unsafe { msg_send![window, contentRectForFrameRect: frame] };

            Some(WindowGeometry {
                outer_width: frame.size.width.round() as u32,
                outer_height: frame.size.height.round() as u32,
                inner_width: content.size.width.round() as u32,
                inner_height: content.size.height.round() as u32,
                x: frame.origin.x.round() as i32,
                // AppKit is bottom-left origin; UI space is top-left.
                y: (screen.height as f64 - (frame.origin.y + frame.size.height)).round() as i32,
            })
        })
    }
}

fn screen_geometry(mtm: MainThreadMarker) -> Option<ScreenGeometry> {
    let screen = NSScreen::mainScreen(mtm)?;
    let frame = screen.frame();
    Some(ScreenGeometry {
        width: frame.size.width.round() as u32,
        height: frame.size.height.round() as u32,
    })
}

/// Run `f` on the main thread, synchronously.
fn on_main<F, R>(f: F) -> R
where
    F: FnOnce(MainThreadMarker) -> R + Send,
    R: Send,
{
    if let Some(mtm) = MainThreadMarker::new() {
        return f(mtm);
    }
    dispatch::Queue::main().exec_sync(move || {
        let mtm = MainThreadMarker::new().expect("main queue runs on the main thread");
        f(mtm)
    })
}

/// Run the AppKit event loop. Never returns in normal operation.
pub fn run_event_loop() {
    let Some(mtm) = MainThreadMarker::new() else {
        error!("Event loop must start on the main thread");
        return;
    };

    let app = NSApplication::sharedApplication(mtm);
    unsafe {
        // NSApplicationActivationPolicyAccessory: hotkey-driven, no Dock icon
        let _: bool = msg_send![&app, setActivationPolicy: 1isize];
        let _: () = msg_send![&app, run];
    }
}
