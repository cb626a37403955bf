//! Logging initialization for `fleetlockctl`.
//!
//! Filter directives come from the `FLEETLOCK_LOG` environment variable and
//! fall back to `warn`, so a successful run prints nothing.
//!
//! ```bash
//! FLEETLOCK_LOG=fleetlock_core=debug fleetlockctl recursive-lock
//! ```

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "FLEETLOCK_LOG";

/// Install the global subscriber, writing to stderr.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
