//! Omni-Wheel viewer.
//!
//! Opens a window, loads the Omni-Wheel model in the background, frames the
//! camera on it once it arrives, and lets the mouse orbit around it.

mod config;
mod viewer;

use anyhow::Result;
use omniview_engine::device::GpuInit;
use omniview_engine::logging::{init_logging, LoggingConfig};
use omniview_engine::window::Runtime;

use crate::config::ViewerConfig;
use crate::viewer::Viewer;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = ViewerConfig::default();
    let runtime = config.runtime();
    let viewer = Viewer::initialize(config)?;

    Runtime::run(runtime, GpuInit::default(), viewer)
}
