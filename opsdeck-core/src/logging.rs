//! Logging bootstrap
//!
//! Structured logging via tracing with a configurable output format. The
//! audit notifier's local fallback writes through this subscriber under the
//! `audit` target.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            filter_directives: vec![
                "opsdeck_core=debug".to_string(),
                "opsdeck_client=debug".to_string(),
                "opsdeck_app=debug".to_string(),
            ],
        }
    }
}

/// Initialize the logging system
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).try_init()?;
        }
        LogFormat::Pretty => {
            registry.with(fmt::layer().pretty()).try_init()?;
        }
        LogFormat::Compact => {
            registry.with(fmt::layer().compact()).try_init()?;
        }
    }

    Ok(())
}
