//! # Development-mode console diagnostics.
//!
//! The runtime logs through [`tracing`] unconditionally. Whether those
//! traces become visible is a pure presentation choice: in production mode
//! no subscriber is installed and the worker runs silently; in development
//! mode a console subscriber with an environment-driven filter is
//! installed. Core behavior is identical either way.

use tracing_subscriber::EnvFilter;

/// Installs console diagnostics when `dev_mode` is true; no-op otherwise.
///
/// The filter honors `RUST_LOG`, defaulting to `info` for this crate.
/// Safe to call when a global subscriber is already set (the attempt is
/// simply discarded).
pub fn init_diagnostics(dev_mode: bool) {
    if !dev_mode {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,comet_runtime=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
