use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};

static INIT: Once = Once::new();

/// Install a global fmt subscriber filtered by `SHAPETRACE_LOG` (default `info`).
///
/// Safe to call repeatedly; only the first call installs. If the host already set a
/// global subscriber, this is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
