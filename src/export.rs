//! Default editor handoff: save the extended crop and copy it to the
//! clipboard.
//!
//! Captures land in ~/Pictures/Snipline/captures (or the configured
//! override) as timestamped PNGs, and the crop is placed on the system
//! clipboard so it can be pasted straight into other applications.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use arboard::Clipboard;
use chrono::Local;
use image::DynamicImage;
use tracing::{info, warn};

use crate::capture::{EditorHandoff, EditorSink};

/// File-and-clipboard consumer of finished captures.
pub struct FileExport {
    output_dir: Option<PathBuf>,
}

impl FileExport {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    /// Configured output directory, or the default under Pictures.
    fn captures_dir(&self) -> Option<PathBuf> {
        if let Some(custom) = &self.output_dir {
            return Some(custom.clone());
        }
        dirs::picture_dir().map(|d| d.join("Snipline").join("captures"))
    }
}

impl EditorSink for FileExport {
    fn open_editor(&self, handoff: EditorHandoff) -> anyhow::Result<()> {
        let dir = self
            .captures_dir()
            .context("could not determine captures directory")?;
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            info!("Created captures directory: {:?}", dir);
        }

        let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        let filename = format!("capture-{}.png", timestamp);
        let filepath = dir.join(&filename);

        handoff
            .image
            .save(&filepath)
            .with_context(|| format!("failed to write {}", filepath.display()))?;
        info!(
            "Capture saved to: {:?} ({}x{} extended from a {}x{} selection of a {}x{} screen)",
            filepath,
            handoff.extended.width,
            handoff.extended.height,
            handoff.region.width,
            handoff.region.height,
            handoff.full.width(),
            handoff.full.height()
        );

        copy_to_clipboard(&handoff.image);
        Ok(())
    }
}

/// Copy a capture to the system clipboard.
///
/// Clipboard failures are logged, not propagated: the file on disk is the
/// primary artifact.
fn copy_to_clipboard(image: &DynamicImage) {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let image_data = arboard::ImageData {
        width: width as usize,
        height: height as usize,
        bytes: rgba.into_raw().into(),
    };

    match Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_image(image_data) {
            Ok(()) => info!("Capture copied to clipboard"),
            Err(e) => warn!("Failed to copy capture to clipboard: {}", e),
        },
        Err(e) => warn!("Failed to initialize clipboard: {}", e),
    }
}
