use crate::config::{AppEnvironment, TelemetryConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' is invalid")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG` wins over the configured level when it parses.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

/// Install the global fmt subscriber. Colour and event targets are only shown during local
/// development.
pub fn init(config: &TelemetryConfig, environment: AppEnvironment) -> Result<(), TelemetryError> {
    let local = environment == AppEnvironment::Development;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(local)
        .with_ansi(local)
        .compact()
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
