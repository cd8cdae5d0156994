//! Meridian map viewer.
//!
//! Environment:
//! - `MERIDIAN_DATA_DIR`: directory with the shapefiles and icons (default `data`)
//! - `MERIDIAN_SINGLE_THREADED=1`: load layers on the render thread
//! - `MERIDIAN_UPDATE_RATE`: frame rate in Hz (default 30, `0` for continuous)
//! - `RUST_LOG`: log filter

mod app;
mod config;

use meridian_engine::device::GpuInit;
use meridian_engine::logging::{LoggingConfig, init_logging};
use meridian_engine::window::Runtime;

use crate::app::ViewerApp;
use crate::config::ViewerConfig;

fn main() {
    init_logging(LoggingConfig::default());

    let config = ViewerConfig::from_env();
    let runtime = config.runtime.clone();

    if let Err(e) = Runtime::run(runtime, GpuInit::default(), ViewerApp::new(config)) {
        log::error!("meridian viewer failed: {e:#}");
        std::process::exit(1);
    }
}
