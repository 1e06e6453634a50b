//! Tracing initialization

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "platter=debug,tower_http=debug";

/// Initialize tracing. `log_format` is `json` for structured output, anything else for the
/// compact console format. Filtering follows `RUST_LOG`.
pub fn init_telemetry(log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = log_format.eq_ignore_ascii_case("json");

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let console_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer().event_format(Format::default().compact().with_target(false))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(log_format = if json { "json" } else { "text" }, "Tracing initialized");
    Ok(())
}
