#![deny(clippy::all)]

mod capture;
mod error;
mod export;
mod geometry;
mod hotkeys;
mod notify;
mod platform;
mod poll;
mod selection;
mod window_control;

use std::sync::Arc;
use tracing::info;

use capture::{CapturePipeline, MonitorSource, DEFAULT_EXTEND_FACTOR};
use export::FileExport;
use notify::LogNotifier;

/// Application configuration
#[derive(serde::Deserialize)]
struct Config {
    capture: CaptureConfig,
}

#[derive(serde::Deserialize)]
struct CaptureConfig {
    extend_factor: Option<f64>,
    output_dir: Option<std::path::PathBuf>,
}

/// Load configuration from embedded config.toml
fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    const CONFIG_TOML: &str = include_str!("../config.toml");
    let config: Config = toml::from_str(CONFIG_TOML)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    // Load configuration from embedded config.toml
    let config = load_config()?;
    let extend_factor = config
        .capture
        .extend_factor
        .unwrap_or(DEFAULT_EXTEND_FACTOR);

    // Build the capture pipeline with the platform collaborators
    let pipeline = CapturePipeline::new(
        platform::create_window_controller(),
        Arc::new(MonitorSource::new()),
        Arc::new(LogNotifier),
        Arc::new(FileExport::new(config.capture.output_dir)),
        Box::new(platform::create_overlay_port),
        extend_factor,
    );

    // Initialize global hotkeys
    let hotkey_manager = hotkeys::init_hotkeys()?;
    info!("Global hotkeys initialized successfully");

    // Hotkey callbacks fire from the listener thread; the pipeline hands
    // each request to the runtime and rejects overlapping sessions itself.
    let pipeline_region = pipeline.clone();
    let pipeline_minimized = pipeline.clone();

    hotkeys::start_hotkey_listener(
        Arc::new(move || {
            info!("Hotkey: interactive region capture");
            pipeline_region.start_region_capture(false);
        }),
        Arc::new(move || {
            info!("Hotkey: minimized-window capture");
            pipeline_minimized.start_region_capture(true);
        }),
    );

    // Keep hotkey manager alive
    std::mem::forget(hotkey_manager);

    info!("Snipline ready - Ctrl+Shift+4 to select a region, Ctrl+Shift+5 for minimized capture");

    // Run the platform event loop
    platform::run_event_loop();

    pipeline.cleanup();
    Ok(())
}
