use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Installs the global subscriber. Safe to call more than once.
///
/// Filter comes from `TAKEHOME_LOG` (e.g. `TAKEHOME_LOG=takehome=debug`),
/// falling back to `takehome=info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("TAKEHOME_LOG")
            .unwrap_or_else(|_| EnvFilter::new("takehome=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
