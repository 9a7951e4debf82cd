//! Geometry primitives shared across the capture pipeline.
//!
//! Two coordinate spaces exist: UI space (logical pixels, as reported by
//! pointer events over the overlay) and screen space (physical pixels of the
//! captured bitmap). `Region` lives in UI space, `PhysicalRect` in screen
//! space; `capture::map_to_screen_space` converts between them.

/// Minimum selection size in logical pixels; smaller drags count as clicks.
pub const MIN_SELECTION_SIZE: u32 = 10;

/// A pointer position in UI-space logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A user-selected rectangle in UI-space logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Normalized bounding box of two corner points.
    ///
    /// Left/top is the per-axis minimum, width/height the per-axis absolute
    /// difference, so every drag quadrant yields the same rectangle for the
    /// same two corners.
    pub fn from_corners(anchor: Point, current: Point) -> Self {
        Self {
            x: anchor.x.min(current.x),
            y: anchor.y.min(current.y),
            width: anchor.x.abs_diff(current.x),
            height: anchor.y.abs_diff(current.y),
        }
    }

    /// Whether the region is large enough to count as a selection.
    pub fn is_valid_selection(&self) -> bool {
        self.width > MIN_SELECTION_SIZE && self.height > MIN_SELECTION_SIZE
    }

    /// Region centered on `screen`, covering `fraction` of each axis.
    ///
    /// Used for minimized-window capture, where no overlay is shown.
    pub fn centered(screen: ScreenGeometry, fraction: f64) -> Self {
        let width = (screen.width as f64 * fraction).round() as u32;
        let height = (screen.height as f64 * fraction).round() as u32;
        Self {
            x: (screen.width.saturating_sub(width) / 2) as i32,
            y: (screen.height.saturating_sub(height) / 2) as i32,
            width,
            height,
        }
    }
}

/// A rectangle in screen-space physical pixels, within the captured bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outer/inner bounds and screen position of the host window.
///
/// Input to the coordinate mapper only; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub x: i32,
    pub y: i32,
}

impl WindowGeometry {
    /// Geometry of a chrome-less surface covering the whole screen.
    ///
    /// Stand-in when no host window exists (the overlay itself is the
    /// pointer surface).
    pub fn covering(screen: ScreenGeometry) -> Self {
        Self {
            outer_width: screen.width,
            outer_height: screen.height,
            inner_width: screen.width,
            inner_height: screen.height,
            x: 0,
            y: 0,
        }
    }
}

/// Logical size of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes_all_quadrants() {
        let a = Point { x: 100, y: 50 };
        let b = Point { x: 300, y: 200 };
        let expected = Region {
            x: 100,
            y: 50,
            width: 200,
            height: 150,
        };

        assert_eq!(Region::from_corners(a, b), expected);
        assert_eq!(Region::from_corners(b, a), expected);
        assert_eq!(
            Region::from_corners(Point { x: 300, y: 50 }, Point { x: 100, y: 200 }),
            expected
        );
        assert_eq!(
            Region::from_corners(Point { x: 100, y: 200 }, Point { x: 300, y: 50 }),
            expected
        );
    }

    #[test]
    fn test_selection_size_threshold() {
        let too_small = Region {
            x: 0,
            y: 0,
            width: 5,
            height: 5,
        };
        assert!(!too_small.is_valid_selection());

        // The threshold is strict: exactly 10 is still a click.
        let boundary = Region {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(!boundary.is_valid_selection());

        let valid = Region {
            x: 0,
            y: 0,
            width: 11,
            height: 11,
        };
        assert!(valid.is_valid_selection());

        let thin = Region {
            x: 0,
            y: 0,
            width: 200,
            height: 3,
        };
        assert!(!thin.is_valid_selection());
    }

    #[test]
    fn test_centered_region_covers_requested_fraction() {
        let screen = ScreenGeometry {
            width: 1920,
            height: 1080,
        };
        let region = Region::centered(screen, 0.6);

        assert_eq!(region.width, 1152);
        assert_eq!(region.height, 648);
        assert_eq!(region.x, 384);
        assert_eq!(region.y, 216);
    }
}
