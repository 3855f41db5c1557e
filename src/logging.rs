use crate::config::LoggingConfig;
use crate::error::{ConfigError, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` is honoured; the crate's own level comes from `level`, or
/// `debug` when the debug flag is set.
pub fn init(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug { "debug" } else { level };
    let directive: Directive = format!("gateway_pipeline={level}")
        .parse()
        .map_err(|e| ConfigError::Validation(format!("Invalid log level '{level}': {e}")))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // A subscriber installed earlier (e.g. by a test harness) stays in place.
    if let Err(e) = installed {
        tracing::debug!("Tracing subscriber already installed: {e}");
    }
    Ok(())
}

pub fn init_from_config(config: &LoggingConfig, debug: bool) -> Result<()> {
    init(&config.level, debug, config.json)
}
