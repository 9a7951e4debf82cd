//! Screen capture source contract and the monitor-backed implementation.
//!
//! Capture is modeled the way desktop capture APIs expose it: enumerate
//! sources, each carrying a bitmap bounded by a resolution hint. When a
//! capture comes back empty the session walks a ladder of decreasing
//! presets before giving up.

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, warn};
use xcap::Monitor;

use crate::error::CaptureError;
use crate::geometry::ScreenGeometry;

/// Resolution presets tried, in order, after a full-resolution attempt
/// comes back empty.
const RESOLUTION_LADDER: [(u32, u32); 3] = [(3840, 2160), (1920, 1080), (1280, 720)];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to enumerate capture sources: {0}")]
    Enumeration(String),

    #[error("screen capture failed: {0}")]
    Capture(String),
}

/// One capturable screen and its bitmap at the requested hint.
pub struct SourceFrame {
    pub name: String,
    pub image: DynamicImage,
}

impl SourceFrame {
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// Provider of full-screen bitmaps, primary display first.
pub trait ScreenCaptureSource: Send + Sync {
    /// Enumerate capturable screens. `hint` bounds the bitmap resolution;
    /// `None` requests full resolution.
    fn list_sources(&self, hint: Option<(u32, u32)>) -> Result<Vec<SourceFrame>, SourceError>;

    /// Logical size of the primary display.
    fn screen_size(&self) -> Result<ScreenGeometry, SourceError>;
}

/// Capture the primary screen, falling back down the resolution ladder when
/// a capture comes back empty.
///
/// Zero enumerated sources is treated as a permission problem; an empty
/// bitmap that survives every ladder rung is an empty capture.
pub(crate) fn capture_full_screen(
    source: &dyn ScreenCaptureSource,
) -> Result<DynamicImage, CaptureError> {
    let hints = std::iter::once(None).chain(RESOLUTION_LADDER.into_iter().map(Some));

    for hint in hints {
        let frames = source
            .list_sources(hint)
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        let Some(frame) = frames.into_iter().next() else {
            return Err(CaptureError::PermissionDenied);
        };

        if frame.is_empty() {
            warn!("Capture at hint {:?} came back empty, trying next preset", hint);
            continue;
        }

        debug!(
            "Captured {} at {}x{}",
            frame.name,
            frame.image.width(),
            frame.image.height()
        );
        return Ok(frame.image);
    }

    Err(CaptureError::EmptyCapture)
}

/// `ScreenCaptureSource` backed by the OS monitor list via `xcap`.
pub struct MonitorSource;

impl MonitorSource {
    pub fn new() -> Self {
        Self
    }

    /// Monitors with the primary display first, so callers can take the
    /// first frame.
    fn monitors() -> Result<Vec<Monitor>, SourceError> {
        let mut monitors =
            Monitor::all().map_err(|e| SourceError::Enumeration(e.to_string()))?;
        monitors.sort_by_key(|m| !m.is_primary().unwrap_or(false));
        Ok(monitors)
    }
}

impl Default for MonitorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenCaptureSource for MonitorSource {
    fn list_sources(&self, hint: Option<(u32, u32)>) -> Result<Vec<SourceFrame>, SourceError> {
        let mut frames = Vec::new();
        for monitor in Self::monitors()? {
            let name = monitor.name().unwrap_or_else(|_| "screen".into());
            let image = monitor
                .capture_image()
                .map_err(|e| SourceError::Capture(e.to_string()))?;
            let mut image = DynamicImage::ImageRgba8(image);

            if let Some((max_width, max_height)) = hint {
                if image.width() > max_width || image.height() > max_height {
                    image = image.thumbnail(max_width, max_height);
                }
            }

            frames.push(SourceFrame { name, image });
        }
        Ok(frames)
    }

    fn screen_size(&self) -> Result<ScreenGeometry, SourceError> {
        let monitor = Self::monitors()?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Enumeration("no monitors found".into()))?;

        // Monitor bounds are logical pixels; the capture itself is physical,
        // and the mapper derives the scale from the two.
        let width = monitor
            .width()
            .map_err(|e| SourceError::Enumeration(e.to_string()))?;
        let height = monitor
            .height()
            .map_err(|e| SourceError::Enumeration(e.to_string()))?;
        Ok(ScreenGeometry { width, height })
    }
}
