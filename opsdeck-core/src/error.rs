//! Unified error handling
//!
//! Structured error types with context and proper error chaining. The
//! taxonomy mirrors how failures are handled: unauthorized responses tear
//! the session down globally, backend business errors are surfaced to the
//! caller, transport failures stay local to the operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type OpsdeckResult<T> = Result<T, OpsdeckError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where the error originated
    pub component: String,
    /// Operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the opsdeck client
#[derive(Error, Debug)]
pub enum OpsdeckError {
    /// Transport-level failure: connection refused, DNS, body read, etc.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// The backend rejected the session. The token has already been cleared
    /// by the time this error is observed.
    #[error("Unauthorized: session rejected by the backend")]
    Unauthorized { context: ErrorContext },

    /// Non-401 error response from the backend. `message` carries the
    /// backend's `detail` text when it provided one.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    /// Token store failure (reading or writing the session file).
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl OpsdeckError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            OpsdeckError::Network { context, .. } => Some(context),
            OpsdeckError::Unauthorized { context } => Some(context),
            OpsdeckError::Api { context, .. } => Some(context),
            OpsdeckError::Config { context, .. } => Some(context),
            OpsdeckError::Validation { context, .. } => Some(context),
            OpsdeckError::NotFound { context, .. } => Some(context),
            OpsdeckError::Storage { context, .. } => Some(context),
            OpsdeckError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether this error is the global session-teardown signal
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, OpsdeckError::Unauthorized { .. })
    }

    /// The user-facing message for inline display. Backend-provided text
    /// for API errors, a generic fallback otherwise.
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            OpsdeckError::Api { message, .. } if !message.is_empty() => message.clone(),
            OpsdeckError::Validation { message, .. } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Log the error with the appropriate level
    pub fn log(&self) {
        match self {
            OpsdeckError::Network { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network error"
                );
            }
            OpsdeckError::Unauthorized { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    "Session rejected, token cleared"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! network_error {
    ($msg:expr, $component:expr) => {
        $crate::OpsdeckError::Network {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::OpsdeckError::Network {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::OpsdeckError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check OPSDECK_* environment variables"),
        }
    };
}
