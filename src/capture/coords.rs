//! UI-space to screen-space coordinate mapping.
//!
//! Pointer coordinates arrive in logical pixels relative to the host
//! window's content area; the captured bitmap is physical screen pixels.
//! Mapping corrects for window chrome (title bar, side borders), the
//! fullscreen/maximized special cases, and the device pixel scale.

use tracing::debug;

use crate::geometry::{PhysicalRect, Region, ScreenGeometry, WindowGeometry};

/// Outer sizes covering at least this fraction of the screen in both axes
/// count as fullscreen.
const FULLSCREEN_COVERAGE: f64 = 0.95;

/// Height a maximized window may lose to a fixed taskbar.
const TASKBAR_HEIGHT: u32 = 40;

/// Inner/outer height gaps at or below this are rounding noise, not chrome.
const CHROME_THRESHOLD: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowMode {
    Fullscreen,
    Maximized,
    Windowed,
}

fn classify(window: &WindowGeometry, screen: ScreenGeometry) -> WindowMode {
    let covers_width = window.outer_width as f64 >= screen.width as f64 * FULLSCREEN_COVERAGE;
    let covers_height = window.outer_height as f64 >= screen.height as f64 * FULLSCREEN_COVERAGE;
    if covers_width && covers_height {
        return WindowMode::Fullscreen;
    }

    let taskbar_deducted = screen.height.saturating_sub(TASKBAR_HEIGHT);
    if window.outer_width == screen.width
        && (window.outer_height == screen.height || window.outer_height == taskbar_deducted)
    {
        return WindowMode::Maximized;
    }

    WindowMode::Windowed
}

/// Map a UI-space selection onto the captured bitmap.
///
/// `captured_width`/`captured_height` are the bitmap's physical dimensions;
/// the per-axis scale is derived from them against the logical screen size,
/// which covers both integer and fractional display scaling. The result is
/// clamped inside the bitmap with at least 1x1 extent to tolerate rounding
/// at the edges.
pub fn map_to_screen_space(
    region: Region,
    window: &WindowGeometry,
    screen: ScreenGeometry,
    captured_width: u32,
    captured_height: u32,
) -> PhysicalRect {
    let mode = classify(window, screen);

    let (offset_x, offset_y) = match mode {
        WindowMode::Fullscreen | WindowMode::Maximized => {
            // Chrome can still be visible (e.g. a maximized window keeps its
            // title bar); only the vertical offset applies.
            let chrome = window.outer_height.saturating_sub(window.inner_height);
            if chrome > CHROME_THRESHOLD {
                (0i64, chrome as i64)
            } else {
                (0, 0)
            }
        }
        WindowMode::Windowed => {
            let title_bar = window.outer_height.saturating_sub(window.inner_height) as i64;
            let side = (window.outer_width.saturating_sub(window.inner_width) / 2) as i64;
            (window.x as i64 + side, window.y as i64 + title_bar)
        }
    };

    let scale_x = captured_width as f64 / screen.width.max(1) as f64;
    let scale_y = captured_height as f64 / screen.height.max(1) as f64;

    let x = ((region.x as i64 + offset_x) as f64 * scale_x).round() as i64;
    let y = ((region.y as i64 + offset_y) as f64 * scale_y).round() as i64;
    let width = (region.width as f64 * scale_x).round() as i64;
    let height = (region.height as f64 * scale_y).round() as i64;

    let rect = clamp_to_image(x, y, width, height, captured_width, captured_height);
    debug!(
        "Mapped region ({},{} {}x{}) via {:?} to ({},{} {}x{})",
        region.x, region.y, region.width, region.height, mode, rect.x, rect.y, rect.width,
        rect.height
    );
    rect
}

fn clamp_to_image(
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    image_width: u32,
    image_height: u32,
) -> PhysicalRect {
    let x = x.clamp(0, image_width.saturating_sub(1) as i64);
    let y = y.clamp(0, image_height.saturating_sub(1) as i64);
    let width = width.clamp(1, (image_width as i64 - x).max(1));
    let height = height.clamp(1, (image_height as i64 - y).max(1));

    PhysicalRect {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenGeometry = ScreenGeometry {
        width: 1920,
        height: 1080,
    };

    fn region(x: i32, y: i32, width: u32, height: u32) -> Region {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_fullscreen_chromeless_maps_one_to_one() {
        let window = WindowGeometry::covering(SCREEN);
        let rect = map_to_screen_space(region(100, 50, 200, 150), &window, SCREEN, 1920, 1080);
        assert_eq!(
            rect,
            PhysicalRect {
                x: 100,
                y: 50,
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn test_fullscreen_with_chrome_offsets_y_only() {
        let window = WindowGeometry {
            outer_width: 1920,
            outer_height: 1080,
            inner_width: 1920,
            inner_height: 1040,
            x: 0,
            y: 0,
        };
        let rect = map_to_screen_space(region(100, 50, 200, 150), &window, SCREEN, 1920, 1080);
        assert_eq!(rect.x, 100);
        assert_eq!(rect.y, 90);
    }

    #[test]
    fn test_maximized_with_taskbar_deduction() {
        let screen = ScreenGeometry {
            width: 800,
            height: 600,
        };
        // 560/600 falls under the fullscreen coverage test but matches the
        // taskbar-deducted screen height; no chrome, so 1:1.
        let window = WindowGeometry {
            outer_width: 800,
            outer_height: 560,
            inner_width: 800,
            inner_height: 560,
            x: 0,
            y: 0,
        };
        let rect = map_to_screen_space(region(10, 20, 300, 200), &window, screen, 800, 600);
        assert_eq!(
            rect,
            PhysicalRect {
                x: 10,
                y: 20,
                width: 300,
                height: 200
            }
        );
    }

    #[test]
    fn test_windowed_adds_position_and_chrome_offsets() {
        let window = WindowGeometry {
            outer_width: 820,
            outer_height: 650,
            inner_width: 800,
            inner_height: 600,
            x: 100,
            y: 200,
        };
        // title bar = 50, side borders = (820-800)/2 = 10
        let rect = map_to_screen_space(region(10, 20, 100, 100), &window, SCREEN, 1920, 1080);
        assert_eq!(rect.x, 120);
        assert_eq!(rect.y, 270);
        assert_eq!(rect.width, 100);
        assert_eq!(rect.height, 100);
    }

    #[test]
    fn test_device_scale_multiplies_all_fields() {
        let window = WindowGeometry::covering(SCREEN);
        // 2x capture of a 1920x1080 logical screen.
        let rect = map_to_screen_space(region(100, 50, 200, 150), &window, SCREEN, 3840, 2160);
        assert_eq!(
            rect,
            PhysicalRect {
                x: 200,
                y: 100,
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn test_fractional_scale_rounds() {
        let window = WindowGeometry::covering(SCREEN);
        // 1.5x scaling.
        let rect = map_to_screen_space(region(101, 51, 201, 151), &window, SCREEN, 2880, 1620);
        assert_eq!(rect.x, 152);
        assert_eq!(rect.y, 77);
        assert_eq!(rect.width, 302);
        assert_eq!(rect.height, 227);
    }

    #[test]
    fn test_result_clamped_inside_image() {
        let window = WindowGeometry::covering(SCREEN);
        let rect = map_to_screen_space(region(1900, 1070, 200, 150), &window, SCREEN, 1920, 1080);
        assert!(rect.x + rect.width <= 1920);
        assert!(rect.y + rect.height <= 1080);
        assert!(rect.width >= 1);
        assert!(rect.height >= 1);
    }

    #[test]
    fn test_negative_origin_clamps_to_zero() {
        let window = WindowGeometry {
            outer_width: 820,
            outer_height: 650,
            inner_width: 800,
            inner_height: 600,
            x: -200,
            y: -300,
        };
        let rect = map_to_screen_space(region(0, 0, 100, 100), &window, SCREEN, 1920, 1080);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
    }
}
