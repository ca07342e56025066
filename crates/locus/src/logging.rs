//! Logging initialization.
//!
//! Logs go to stderr so stdout stays reserved for reports. `RUST_LOG`
//! overrides the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber with `level` as the default filter.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// `--verbose` and `--json-logs` take precedence over the file.
pub fn init_from_config(config: &locus_core::Config, verbose: bool, json_logs: bool) {
    let (level, json_format) = resolve(&config.logging, verbose, json_logs);
    init(level, json_format);
}

fn resolve(
    logging: &locus_core::config::LoggingConfig,
    verbose: bool,
    json_logs: bool,
) -> (&str, bool) {
    let level = if verbose && !matches!(logging.level.as_str(), "trace") {
        "debug"
    } else {
        logging.level.as_str()
    };
    (level, json_logs || logging.format == "json")
}
