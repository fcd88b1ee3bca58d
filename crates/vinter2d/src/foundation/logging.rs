//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Intended for binaries; the library
/// itself only emits through the `log` facade.
pub fn init() {
    // A second call (for example from several tests) is harmless
    let _ = env_logger::try_init();
}
