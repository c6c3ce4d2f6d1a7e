//! Tracing subscriber setup, shared by all three binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber: a plain formatting layer filtered
/// by `RUST_LOG` (defaulting to `info` when unset).
pub fn init() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
