//! Configuration management
//!
//! All runtime configuration comes from the environment. Everything is
//! optional with documented fallbacks: without a backend URL the client
//! targets the local development backend, and without a telemetry
//! connection string audit events go to the local log only.

use std::path::PathBuf;

use crate::error::{ErrorContext, OpsdeckError, OpsdeckResult};
use crate::logging::LoggingConfig;

/// Backend base URL used when `OPSDECK_API_URL` is unset.
///
/// The browser original fell back to a relative `/api` path; a native
/// client needs an absolute origin, so the fallback targets the local
/// development backend's `/api` prefix instead.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable names
pub const ENV_API_URL: &str = "OPSDECK_API_URL";
pub const ENV_TELEMETRY_CONNECTION: &str = "OPSDECK_TELEMETRY_CONNECTION";
pub const ENV_TOKEN_PATH: &str = "OPSDECK_TOKEN_PATH";

/// Top-level configuration for the opsdeck client
#[derive(Debug, Clone)]
pub struct OpsdeckConfig {
    /// Backend base URL, including the `/api` prefix
    pub api_base_url: String,
    /// Telemetry sink connection string; None means local-log-only audit
    pub telemetry_connection: Option<String>,
    /// Where the session token is persisted
    pub token_path: PathBuf,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for OpsdeckConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            telemetry_connection: None,
            token_path: default_token_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OpsdeckConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> OpsdeckResult<Self> {
        let api_base_url = match std::env::var(ENV_API_URL) {
            Ok(url) if !url.trim().is_empty() => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(OpsdeckError::Config {
                        message: format!("{} must be an absolute http(s) URL, got '{}'", ENV_API_URL, url),
                        source: None,
                        context: ErrorContext::new("config")
                            .with_operation("from_env")
                            .with_suggestion("Example: OPSDECK_API_URL=https://ops.example.com/api"),
                    });
                }
                url
            }
            _ => DEFAULT_API_URL.to_string(),
        };

        let telemetry_connection = std::env::var(ENV_TELEMETRY_CONNECTION)
            .ok()
            .filter(|s| !s.trim().is_empty());

        let token_path = std::env::var(ENV_TOKEN_PATH)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_token_path);

        Ok(Self {
            api_base_url,
            telemetry_connection,
            token_path,
            logging: LoggingConfig::default(),
        })
    }
}

/// Fixed location of the persisted session token.
///
/// This is the client's only durable state: a single opaque token string
/// under a fixed name in the platform data directory.
pub fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opsdeck")
        .join("token")
}
