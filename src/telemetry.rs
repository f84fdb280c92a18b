use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
/// Records from the `log` crate (actix's request logger) are forwarded too.
pub fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_file(false)).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_file(true).with_line_number(true)).try_init(),
    };

    if let Err(e) = result {
        eprintln!("Warning: Failed to initialize tracing: {}", e);
    }
}
