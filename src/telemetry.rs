use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging.
///
/// Logs go to stderr so they stay out of the way of the interactive prompts
/// on stdout. The level comes from `RUST_LOG`, defaulting to `warn`; `json`
/// switches to one JSON object per event.
pub fn init(json: bool) {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .compact()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(json_layer)
        .with(text_layer)
        .init();
}
