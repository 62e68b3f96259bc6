//! Telemetry and Observability
//!
//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,live_classroom=debug,sqlx=warn,tower_http=debug";

/// Initialize tracing subscriber. `format` is `"json"` for machine-readable
/// output, anything else gives human-readable lines.
pub fn init_tracing(format: &str) {
    init_tracing_with(format, DEFAULT_FILTER);
}

/// Same as [`init_tracing`] with another fallback filter when `RUST_LOG` is unset
pub fn init_tracing_with(format: &str, default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::debug!("Tracing initialized");
}
