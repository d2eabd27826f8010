//! Harness setup.
//!
//! Nothing is registered when the crate is loaded. Test harnesses call
//! [`init`] once (calling it again is harmless) before driving components.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "COMPONENT_DRIVER_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Initialize process-wide test support.
///
/// Installs a `tracing` subscriber writing through the test writer, filtered
/// by [`LOG_ENV`]. Only the first call does anything; if another subscriber
/// is already installed it is left in place.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Whether [`init`] has run
#[must_use]
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(is_initialized());
    }
}
