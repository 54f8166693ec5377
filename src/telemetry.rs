use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Installs the global fmt subscriber, filtered by `RUST_LOG` (default
/// `info`). Only the first call has any effect.
pub fn init_tracing() {
    INITIALISED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);

        // another subscriber may already be installed, e.g. by a test harness
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();

        assert!(INITIALISED.get().is_some());
    }
}
