//! Profile view: the caller's own profile editor
//!
//! State machine: `loading → ready` on a successful fetch, `loading →
//! redirected` on any fetch failure. While ready, the form fields are
//! local and independent of the fetched snapshot until submit.

use std::sync::Arc;

use opsdeck_client::ApiClient;
use opsdeck_core::{ProfileUpdate, UserProfile};
use tracing::debug;

use crate::audit::{actions, AuditEvent, AuditNotifier};
use crate::views::{Message, ViewState};
use crate::{AppError, AppResult};

/// Snapshot plus the independent form state
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
    /// Last representation returned by the server
    pub user: UserProfile,
    /// Local form fields, only reconciled on submit
    pub form: ProfileUpdate,
}

pub struct ProfileView {
    client: ApiClient,
    notifier: Arc<dyn AuditNotifier>,
    state: ViewState<ProfileData>,
    message: Option<Message>,
    saving: bool,
}

impl ProfileView {
    /// Mount the view: fetch the caller's profile and seed the form.
    ///
    /// Any fetch failure redirects to login, matching the original's
    /// behavior of treating a failed self-fetch as a dead session.
    pub async fn mount(client: ApiClient, notifier: Arc<dyn AuditNotifier>) -> AppResult<Self> {
        let user = client.get_me().await.map_err(|e| {
            debug!(error = %e, "Profile fetch failed, redirecting");
            AppError::RedirectToLogin
        })?;

        let form = ProfileUpdate::from_profile(&user);
        Ok(Self {
            client,
            notifier,
            state: ViewState::Ready(ProfileData { user, form }),
            message: None,
            saving: false,
        })
    }

    pub fn state(&self) -> &ViewState<ProfileData> {
        &self.state
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.state.ready().map(|data| &data.user)
    }

    /// Mutable access to the local form fields
    pub fn form_mut(&mut self) -> Option<&mut ProfileUpdate> {
        self.state.ready_mut().map(|data| &mut data.form)
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Submit the form.
    ///
    /// On success the snapshot is replaced by the server's returned
    /// representation; on a business or transport error the form and the
    /// previous snapshot are both retained and an inline message is shown.
    pub async fn submit(&mut self) -> AppResult<()> {
        let Some(data) = self.state.ready_mut() else {
            return Ok(());
        };
        let update = data.form.clone();
        let actor = data.user.email.clone();

        self.saving = true;
        let result = self.client.update_me(&update).await;
        self.saving = false;

        match result {
            Ok(updated) => {
                if let Some(data) = self.state.ready_mut() {
                    data.user = updated;
                }
                self.message = Some(Message::success("Profile updated successfully!"));
                self.notifier
                    .notify(
                        AuditEvent::new(actor.clone(), actions::UPDATE_PROFILE)
                            .with_target_user(actor),
                    )
                    .await;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(AppError::RedirectToLogin),
            Err(e) => {
                self.message = Some(Message::error(
                    e.display_message("Failed to update profile"),
                ));
                Ok(())
            }
        }
    }

    /// Upload an avatar image.
    ///
    /// This is a side-channel mutation: the file uploads immediately and
    /// the snapshot is replaced on success, independent of the form's
    /// saved/unsaved state (the form fields are untouched either way).
    pub async fn upload_avatar(&mut self, file_name: &str, bytes: Vec<u8>) -> AppResult<()> {
        let Some(actor) = self.user().map(|u| u.email.clone()) else {
            return Ok(());
        };

        match self.client.upload_avatar(file_name, bytes).await {
            Ok(updated) => {
                if let Some(data) = self.state.ready_mut() {
                    data.user = updated;
                }
                self.message = Some(Message::success("Avatar uploaded successfully!"));
                self.notifier
                    .notify(
                        AuditEvent::new(actor.clone(), actions::UPLOAD_AVATAR)
                            .with_target_user(actor),
                    )
                    .await;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(AppError::RedirectToLogin),
            Err(e) => {
                self.message = Some(Message::error(e.display_message("Failed to upload avatar")));
                Ok(())
            }
        }
    }

    /// Log out: best-effort audit event first, then session teardown.
    ///
    /// The audit emission can never block the logout, and tearing down an
    /// already-empty session is a no-op.
    pub async fn logout(&mut self) -> AppResult<()> {
        let actor = self
            .user()
            .map(|u| u.email.clone())
            .unwrap_or_else(|| "unknown".to_string());
        self.notifier
            .notify(AuditEvent::new(actor.clone(), actions::USER_LOGOUT).with_target_user(actor))
            .await;

        self.client.session().teardown().map_err(AppError::Client)?;
        Ok(())
    }
}
