use quoter_core::config::{LogFormat, LoggingConfig};
use tracing::Level;

/// Installs the global subscriber. Logs go to stderr so stdout stays machine-readable.
/// Later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
