use crate::models::config::LoggingConfig;
use tracing::Level;

fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Install the global fmt subscriber described by `config`.
///
/// Returns `false` if a subscriber was already installed; calling this more
/// than once is harmless.
pub fn init(config: &LoggingConfig) -> bool {
    let level = parse_level(&config.level);
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %level, json = config.json, "Logging initialized");
    }
    installed
}
