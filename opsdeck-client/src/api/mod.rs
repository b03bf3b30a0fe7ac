//! API client for the backend resource groups
//!
//! One client wraps the three resource groups (auth, users, config). Every
//! request goes through the same pipeline: attach the bearer token when a
//! session exists, send, then apply the global response policy — any 401
//! tears the session down unconditionally, whichever operation triggered
//! it. All other error responses are surfaced to the caller unmodified for
//! local handling.

use opsdeck_core::{ErrorContext, OpsdeckConfig, OpsdeckError, OpsdeckResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::session::SessionContext;

pub mod auth;
pub mod config;
pub mod users;


/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the backend, including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds (transport-level only; no per-operation
    /// timeouts are enforced)
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: opsdeck_core::DEFAULT_API_URL.to_string(),
            timeout_seconds: 30,
            user_agent: "opsdeck/0.1".to_string(),
        }
    }
}

impl ApiClientConfig {
    /// Derive the client configuration from the application configuration
    pub fn from_config(config: &OpsdeckConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Error body shape used by the backend for business errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// HTTP client for the backend
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    session: SessionContext,
}

impl ApiClient {
    /// Create a new API client bound to a session context
    pub fn new(config: ApiClientConfig, session: SessionContext) -> OpsdeckResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
                OpsdeckError::Config {
                    message: format!("Invalid user agent: {}", e),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("api_client").with_operation("new"),
                }
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| OpsdeckError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("api_client").with_operation("new"),
            })?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// The session context this client reads tokens from and tears down
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Start a request, attaching the bearer token when a session exists.
    /// JSON bodies get their content type from reqwest's `.json()`.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "API request");

        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and apply the global response policy.
    ///
    /// This is the single policy point for session teardown: any 401
    /// clears the stored token, regardless of which operation triggered
    /// it. Other error statuses surface the backend's `detail` text.
    pub(crate) async fn execute(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> OpsdeckResult<Response> {
        let response = builder.send().await.map_err(|e| OpsdeckError::Network {
            message: format!("Request failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation(operation),
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.session.teardown() {
                // The session is logically dead either way; the caller
                // still gets the unauthorized outcome.
                warn!(error = %e, "Failed to clear stored token after 401");
            }
            return Err(OpsdeckError::Unauthorized {
                context: ErrorContext::new("api_client")
                    .with_operation(operation)
                    .with_suggestion("Log in again"),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            return Err(OpsdeckError::Api {
                status: status.as_u16(),
                message: detail,
                context: ErrorContext::new("api_client").with_operation(operation),
            });
        }

        Ok(response)
    }

    /// Decode a JSON response body
    pub(crate) async fn receive_json<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
        operation: &str,
    ) -> OpsdeckResult<T> {
        response.json().await.map_err(|e| OpsdeckError::Network {
            message: format!("Invalid response body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation(operation),
        })
    }
}
