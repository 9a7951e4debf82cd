//! Margin-extended crop of the captured bitmap.
//!
//! The downstream editor gets the selection plus surrounding context: the
//! rectangle grows by a fraction of its size per side, clamped to the image.

use image::DynamicImage;
use tracing::debug;

use crate::geometry::PhysicalRect;

/// Fraction of each region dimension added on every side.
pub const DEFAULT_EXTEND_FACTOR: f64 = 0.2;

/// Grow `rect` by `factor` per side, clamped to the image bounds.
///
/// The extension is floored to whole pixels. When the left/top clamp eats
/// part of the margin, the width/height clamp pulls the right/bottom edge in
/// correspondingly, so the result never leaves the image on either side. The
/// result always contains `rect` (assuming `rect` itself is in bounds).
pub fn extend_rect(
    rect: PhysicalRect,
    image_width: u32,
    image_height: u32,
    factor: f64,
) -> PhysicalRect {
    let ext_x = (rect.width as f64 * factor).floor() as u32;
    let ext_y = (rect.height as f64 * factor).floor() as u32;

    let x = rect.x.saturating_sub(ext_x);
    let y = rect.y.saturating_sub(ext_y);
    let width = rect
        .width
        .saturating_add(2 * ext_x)
        .min(image_width.saturating_sub(x));
    let height = rect
        .height
        .saturating_add(2 * ext_y)
        .min(image_height.saturating_sub(y));

    PhysicalRect {
        x,
        y,
        width,
        height,
    }
}

/// Extend `rect` and cut the matching bitmap out of `full`.
///
/// The returned image is sized exactly to the extended rectangle.
pub fn extended_crop(
    full: &DynamicImage,
    rect: PhysicalRect,
    factor: f64,
) -> (PhysicalRect, DynamicImage) {
    let extended = extend_rect(rect, full.width(), full.height(), factor);
    let image = full.crop_imm(extended.x, extended.y, extended.width, extended.height);
    debug!(
        "Extended crop {}x{} at ({},{}) from {}x{} selection",
        extended.width, extended.height, extended.x, extended.y, rect.width, rect.height
    );
    (extended, image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> PhysicalRect {
        PhysicalRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_extend_exact_arithmetic() {
        // ext_x = floor(100 * 0.2) = 20, ext_y = floor(80 * 0.2) = 16
        let extended = extend_rect(rect(50, 50, 100, 80), 1000, 800, 0.2);
        assert_eq!(extended, rect(30, 34, 140, 112));
    }

    #[test]
    fn test_extend_clamps_at_origin() {
        // Left/top margin truncated by the image edge.
        let extended = extend_rect(rect(5, 5, 100, 80), 1000, 800, 0.2);
        assert_eq!(extended.x, 0);
        assert_eq!(extended.y, 0);
        assert!(extended.x + extended.width <= 1000);
        assert!(extended.y + extended.height <= 800);
    }

    #[test]
    fn test_extend_clamps_at_far_edge() {
        let extended = extend_rect(rect(920, 750, 100, 80), 1000, 800, 0.2);
        assert_eq!(extended.x, 900);
        assert_eq!(extended.y, 734);
        // width capped at image_width - x, not width + 2*ext
        assert_eq!(extended.width, 100);
        assert_eq!(extended.height, 66);
    }

    #[test]
    fn test_extended_always_contains_original() {
        let cases = [
            rect(0, 0, 50, 50),
            rect(50, 50, 100, 80),
            rect(900, 700, 100, 100),
            rect(0, 750, 1000, 50),
            rect(499, 399, 13, 17),
        ];
        for original in cases {
            let extended = extend_rect(original, 1000, 800, 0.2);
            assert!(extended.x <= original.x, "{:?}", original);
            assert!(extended.y <= original.y, "{:?}", original);
            assert!(
                extended.x + extended.width >= original.x + original.width,
                "{:?}",
                original
            );
            assert!(
                extended.y + extended.height >= original.y + original.height,
                "{:?}",
                original
            );
            assert!(extended.x + extended.width <= 1000, "{:?}", original);
            assert!(extended.y + extended.height <= 800, "{:?}", original);
        }
    }

    #[test]
    fn test_zero_factor_is_identity() {
        let original = rect(50, 50, 100, 80);
        assert_eq!(extend_rect(original, 1000, 800, 0.0), original);
    }

    #[test]
    fn test_extended_crop_sizes_bitmap_exactly() {
        let full = DynamicImage::ImageRgba8(RgbaImage::new(1000, 800));
        let (extended, image) = extended_crop(&full, rect(50, 50, 100, 80), 0.2);
        assert_eq!(extended, rect(30, 34, 140, 112));
        assert_eq!(image.width(), 140);
        assert_eq!(image.height(), 112);
    }
}
