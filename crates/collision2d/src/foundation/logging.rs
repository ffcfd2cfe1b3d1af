//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring a logger that is already installed
///
/// Safe to call from every test or from several binaries sharing a process.
pub fn try_init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
