//! Opsdeck Applications - the view layer behind the admin console
//!
//! This crate builds the user-facing state machines on top of the API
//! client:
//!
//! - Session guard for protected views
//! - Profile view (self-service profile editing and avatar upload)
//! - Admin view (system configuration and user role management)
//! - Audit notifier port with telemetry and local-log implementations
//!
//! Presentation (CLI or any other front end) renders these states; no
//! rendering concerns live here.

pub mod audit;
pub mod guard;
pub mod views;

pub use audit::{notifier_from_config, AuditEvent, AuditNotifier, LogAuditNotifier};
pub use guard::{check_session, Gate};
pub use views::{
    AdminData, AdminTab, AdminView, Message, MessageKind, ProfileData, ProfileView, ViewState,
};

use opsdeck_core::OpsdeckError;

/// Application-level error type.
///
/// Unauthorized outcomes are folded into [`AppError::RedirectToLogin`] so
/// the presentation layer has a single redirect signal; everything else
/// the views either absorb into an inline message or pass through here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The session was torn down (missing or rejected credential); the
    /// front end should send the user to the login entry point.
    #[error("Session is gone: log in to continue")]
    RedirectToLogin,

    #[error(transparent)]
    Client(OpsdeckError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<OpsdeckError> for AppError {
    fn from(err: OpsdeckError) -> Self {
        if err.is_unauthorized() {
            AppError::RedirectToLogin
        } else {
            AppError::Client(err)
        }
    }
}
