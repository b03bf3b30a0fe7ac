//! Audit notification port
//!
//! Best-effort, fire-and-forget event emission to an external telemetry
//! sink, falling back to the local structured log when no sink is
//! configured. Notification is never on the critical path: `notify` is
//! infallible from the caller's perspective, and sink failures are logged
//! and swallowed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsdeck_core::{ErrorContext, OpsdeckConfig, OpsdeckError, OpsdeckResult};
use serde::Serialize;
use tracing::{info, warn};

/// Tenant label used when no target tenant is given
pub const DEFAULT_TENANT: &str = "default";

/// Well-known action labels
pub mod actions {
    pub const USER_LOGIN: &str = "USER_LOGIN";
    pub const USER_REGISTER: &str = "USER_REGISTER";
    pub const USER_LOGOUT: &str = "USER_LOGOUT";
    pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
    pub const UPLOAD_AVATAR: &str = "UPLOAD_AVATAR";
    pub const UPDATE_USER_ROLE: &str = "UPDATE_USER_ROLE";
    pub const CONFIG_CHANGE: &str = "CONFIG_CHANGE";
}

/// A structured record of a user/admin action
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Who performed the action (email, or "unknown")
    pub actor: String,
    /// Action label, e.g. `UPDATE_USER_ROLE`
    pub action: String,
    /// Tenant being affected
    pub target_tenant: String,
    /// User being affected, when the action targets one
    pub target_user: Option<String>,
    /// Free-form additional details
    pub details: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            target_tenant: DEFAULT_TENANT.to_string(),
            target_user: None,
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_target_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.target_tenant = tenant.into();
        self
    }

    pub fn with_target_user(mut self, user: impl Into<String>) -> Self {
        self.target_user = Some(user.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Non-blocking notification port for audit events.
///
/// Implementations must never propagate failure to the caller.
#[async_trait]
pub trait AuditNotifier: Send + Sync {
    async fn notify(&self, event: AuditEvent);
}

/// Local fallback: write the event to the structured log
#[derive(Default)]
pub struct LogAuditNotifier;

#[async_trait]
impl AuditNotifier for LogAuditNotifier {
    async fn notify(&self, event: AuditEvent) {
        info!(
            target: "audit",
            actor = %event.actor,
            action = %event.action,
            target_tenant = %event.target_tenant,
            target_user = event.target_user.as_deref().unwrap_or(""),
            details = ?event.details,
            "AUDIT"
        );
    }
}

/// Telemetry sink speaking the Application Insights track-event wire shape
pub struct TelemetryAuditNotifier {
    client: reqwest::Client,
    endpoint: String,
    instrumentation_key: String,
}

impl TelemetryAuditNotifier {
    const DEFAULT_INGESTION_ENDPOINT: &'static str = "https://dc.services.visualstudio.com/";

    /// Parse a connection string of the form
    /// `InstrumentationKey=<key>;IngestionEndpoint=<url>`.
    pub fn from_connection_string(connection: &str) -> OpsdeckResult<Self> {
        let mut instrumentation_key = None;
        let mut endpoint = Self::DEFAULT_INGESTION_ENDPOINT.to_string();

        for pair in connection.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some(("InstrumentationKey", value)) => {
                    instrumentation_key = Some(value.to_string());
                }
                Some(("IngestionEndpoint", value)) => {
                    endpoint = value.to_string();
                }
                _ => {}
            }
        }

        let instrumentation_key = instrumentation_key.ok_or_else(|| OpsdeckError::Config {
            message: "Telemetry connection string has no InstrumentationKey".to_string(),
            source: None,
            context: ErrorContext::new("audit")
                .with_operation("from_connection_string")
                .with_suggestion(
                    "Expected InstrumentationKey=<key>;IngestionEndpoint=<url>",
                ),
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| OpsdeckError::Config {
                message: format!("Failed to create telemetry client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("audit").with_operation("from_connection_string"),
            })?;

        Ok(Self {
            client,
            endpoint,
            instrumentation_key,
        })
    }

    fn track_url(&self) -> String {
        format!("{}/v2/track", self.endpoint.trim_end_matches('/'))
    }

    fn envelope(&self, event: &AuditEvent) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        properties.insert("Admin_User".into(), event.actor.clone().into());
        properties.insert("Action".into(), event.action.clone().into());
        properties.insert("Target_Tenant".into(), event.target_tenant.clone().into());
        properties.insert(
            "Target_User".into(),
            event.target_user.clone().unwrap_or_default().into(),
        );
        properties.insert("Timestamp".into(), event.timestamp.to_rfc3339().into());
        for (key, value) in &event.details {
            properties.insert(key.clone(), value.clone().into());
        }

        serde_json::json!({
            "name": "Microsoft.ApplicationInsights.Event",
            "time": event.timestamp.to_rfc3339(),
            "iKey": self.instrumentation_key,
            "data": {
                "baseType": "EventData",
                "baseData": {
                    "ver": 2,
                    "name": "AdminAction",
                    "properties": properties,
                }
            }
        })
    }
}

#[async_trait]
impl AuditNotifier for TelemetryAuditNotifier {
    async fn notify(&self, event: AuditEvent) {
        let envelope = self.envelope(&event);
        match self
            .client
            .post(self.track_url())
            .json(&envelope)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    action = %event.action,
                    "Telemetry sink rejected audit event"
                );
            }
            Err(e) => {
                warn!(error = %e, action = %event.action, "Failed to emit audit event");
            }
        }
    }
}

/// Build the audit notifier from configuration: telemetry when a
/// connection string is present and parseable, local log otherwise.
pub fn notifier_from_config(config: &OpsdeckConfig) -> Arc<dyn AuditNotifier> {
    match &config.telemetry_connection {
        Some(connection) => match TelemetryAuditNotifier::from_connection_string(connection) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!(error = %e, "Invalid telemetry connection string, auditing to local log");
                Arc::new(LogAuditNotifier)
            }
        },
        None => Arc::new(LogAuditNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_defaults_to_default_tenant() {
        let event = AuditEvent::new("admin@example.com", actions::UPDATE_USER_ROLE);
        assert_eq!(event.target_tenant, DEFAULT_TENANT);
        assert!(event.target_user.is_none());
        assert!(event.details.is_empty());
    }

    #[test]
    fn connection_string_parsing() {
        let notifier = TelemetryAuditNotifier::from_connection_string(
            "InstrumentationKey=abc-123;IngestionEndpoint=https://ingest.example.com/",
        )
        .unwrap();
        assert_eq!(notifier.instrumentation_key, "abc-123");
        assert_eq!(notifier.track_url(), "https://ingest.example.com/v2/track");

        // Endpoint is optional
        let notifier =
            TelemetryAuditNotifier::from_connection_string("InstrumentationKey=abc-123").unwrap();
        assert_eq!(
            notifier.track_url(),
            "https://dc.services.visualstudio.com/v2/track"
        );

        // Key is not
        assert!(TelemetryAuditNotifier::from_connection_string("IngestionEndpoint=x").is_err());
    }

    #[test]
    fn envelope_carries_audit_fields() {
        let notifier =
            TelemetryAuditNotifier::from_connection_string("InstrumentationKey=abc-123").unwrap();
        let event = AuditEvent::new("admin@example.com", actions::CONFIG_CHANGE)
            .with_target_user("user@example.com")
            .with_detail("Config_Key", "theme");

        let envelope = notifier.envelope(&event);
        let properties = &envelope["data"]["baseData"]["properties"];
        assert_eq!(properties["Admin_User"], "admin@example.com");
        assert_eq!(properties["Action"], "CONFIG_CHANGE");
        assert_eq!(properties["Target_Tenant"], "default");
        assert_eq!(properties["Target_User"], "user@example.com");
        assert_eq!(properties["Config_Key"], "theme");
    }

    #[tokio::test]
    async fn unreachable_sink_never_fails_the_caller() {
        let notifier = TelemetryAuditNotifier::from_connection_string(
            "InstrumentationKey=abc;IngestionEndpoint=http://127.0.0.1:1",
        )
        .unwrap();
        // Must return normally despite the connection failure
        notifier
            .notify(AuditEvent::new("admin@example.com", actions::USER_LOGOUT))
            .await;
    }
}
