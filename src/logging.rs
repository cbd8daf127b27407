//! Tracing setup for hosts without their own subscriber.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global tracing subscriber for this crate's messages.
///
/// Log level is controlled by:
/// 1. `debug` sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Returns `false` if another global subscriber is already installed, in
/// which case that subscriber keeps receiving the updater's events.
pub fn init_tracing(debug: bool) -> bool {
    let filter = if debug {
        EnvFilter::new("plugin_updater=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plugin_updater=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
        .is_ok()
}
