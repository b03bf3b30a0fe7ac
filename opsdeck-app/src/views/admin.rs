//! Admin view: system configuration and user role management
//!
//! The capability check runs once at view entry and produces the typed
//! view state; non-admins get `AccessDenied` and no config or user-list
//! requests are ever issued for them. For admins, the two initial fetches
//! run concurrently with no ordering dependency.

use std::collections::HashMap;
use std::sync::Arc;

use opsdeck_client::ApiClient;
use opsdeck_core::{Capability, ConfigEntry, ConfigUpdate, Role, UserProfile};
use tracing::debug;

use crate::audit::{actions, AuditEvent, AuditNotifier};
use crate::views::{Message, ViewState};
use crate::{AppError, AppResult};

/// Snapshot owned by the admin view
#[derive(Debug, Clone, PartialEq)]
pub struct AdminData {
    /// The admin viewing the page
    pub current: UserProfile,
    /// Full configuration snapshot, mutated locally until per-entry save
    pub configs: Vec<ConfigEntry>,
    /// User list for role management
    pub users: Vec<UserProfile>,
}

/// The two tabs partitioning the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
    SystemSettings,
    UserPermissions,
}

pub struct AdminView {
    client: ApiClient,
    notifier: Arc<dyn AuditNotifier>,
    state: ViewState<AdminData>,
    active_tab: AdminTab,
    message: Option<Message>,
    saving: bool,
    /// Last server-acknowledged value per config key, for audit old/new
    persisted_values: HashMap<String, String>,
}

impl AdminView {
    /// Mount the view.
    ///
    /// Fetches the current user once; if the caller lacks the view's
    /// capability the state becomes `AccessDenied` and no further data is
    /// fetched. Otherwise configs and users are fetched concurrently.
    pub async fn mount(client: ApiClient, notifier: Arc<dyn AuditNotifier>) -> AppResult<Self> {
        let mut view = Self {
            client,
            notifier,
            state: ViewState::Loading,
            active_tab: AdminTab::SystemSettings,
            message: None,
            saving: false,
            persisted_values: HashMap::new(),
        };

        let current = match view.client.get_me().await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => return Err(AppError::RedirectToLogin),
            Err(e) => {
                debug!(error = %e, "Admin self-fetch failed");
                view.state = ViewState::AccessDenied;
                view.message = Some(Message::error(e.display_message("Failed to load data")));
                return Ok(view);
            }
        };

        if !current.role.can(Capability::ViewConfig) {
            view.state = ViewState::AccessDenied;
            view.message = Some(Message::error("Admin access required"));
            return Ok(view);
        }

        // Independent fetches, either may complete first
        let (configs, users) = tokio::join!(view.client.list_configs(), view.client.list_users());

        for result in [configs.as_ref().err(), users.as_ref().err()] {
            if result.map(|e| e.is_unauthorized()).unwrap_or(false) {
                return Err(AppError::RedirectToLogin);
            }
        }

        let (configs, users) = match (configs, users) {
            (Ok(configs), Ok(users)) => (configs, users),
            (configs, users) => {
                view.message = Some(Message::error("Failed to load data"));
                (configs.unwrap_or_default(), users.unwrap_or_default())
            }
        };

        view.persisted_values = configs
            .iter()
            .map(|c| (c.key.clone(), c.value.clone()))
            .collect();
        view.state = ViewState::Ready(AdminData {
            current,
            configs,
            users,
        });
        Ok(view)
    }

    pub fn state(&self) -> &ViewState<AdminData> {
        &self.state
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn active_tab(&self) -> AdminTab {
        self.active_tab
    }

    pub fn set_tab(&mut self, tab: AdminTab) {
        self.active_tab = tab;
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Whether the role control for a row is enabled. The caller's own
    /// row is always disabled to prevent self-demotion through this view.
    pub fn role_control_enabled(&self, user_id: i64) -> bool {
        self.state
            .ready()
            .map(|data| data.current.id != user_id)
            .unwrap_or(false)
    }

    /// Mutate one entry's value in memory. Does not persist, and has no
    /// effect on any other entry's unsaved edits.
    pub fn edit_config_value(&mut self, key: &str, value: impl Into<String>) {
        if let Some(data) = self.state.ready_mut() {
            if let Some(entry) = data.configs.iter_mut().find(|c| c.key == key) {
                entry.value = value.into();
            }
        }
    }

    /// Persist one entry: issues an update carrying that entry's key,
    /// value, and description only.
    pub async fn save_config(&mut self, key: &str) -> AppResult<()> {
        let Some((update, actor)) = self.state.ready().and_then(|data| {
            data.configs
                .iter()
                .find(|c| c.key == key)
                .map(|entry| (ConfigUpdate::from(entry), data.current.email.clone()))
        }) else {
            return Ok(());
        };
        let old_value = self
            .persisted_values
            .get(key)
            .cloned()
            .unwrap_or_default();

        self.saving = true;
        let result = self.client.update_config(&update).await;
        self.saving = false;

        match result {
            Ok(saved) => {
                self.persisted_values
                    .insert(saved.key.clone(), saved.value.clone());
                if let Some(data) = self.state.ready_mut() {
                    if let Some(entry) = data.configs.iter_mut().find(|c| c.key == key) {
                        *entry = saved;
                    }
                }
                self.message = Some(Message::success(format!("{} saved!", key)));
                self.notifier
                    .notify(
                        AuditEvent::new(actor, actions::CONFIG_CHANGE)
                            .with_detail("Config_Key", key)
                            .with_detail("Old_Value", old_value)
                            .with_detail("New_Value", update.value.clone()),
                    )
                    .await;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(AppError::RedirectToLogin),
            Err(e) => {
                self.message = Some(Message::error(e.display_message("Failed to save")));
                Ok(())
            }
        }
    }

    /// Change another user's role.
    ///
    /// Issues the update immediately (no separate save step) and updates
    /// the local row optimistically on success; on failure the list is
    /// left unchanged and an error message is shown. The caller's own row
    /// is rejected without issuing a request.
    pub async fn change_role(&mut self, user_id: i64, role: Role) -> AppResult<()> {
        let Some(data) = self.state.ready() else {
            return Ok(());
        };
        if data.current.id == user_id {
            self.message = Some(Message::error("Cannot change your own role"));
            return Ok(());
        }
        let actor = data.current.email.clone();
        let target = data
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.clone());

        match self.client.update_role(user_id, role).await {
            Ok(updated) => {
                if let Some(data) = self.state.ready_mut() {
                    if let Some(row) = data.users.iter_mut().find(|u| u.id == user_id) {
                        *row = updated;
                    }
                }
                self.message = Some(Message::success("Role updated!"));
                let mut event = AuditEvent::new(actor, actions::UPDATE_USER_ROLE)
                    .with_detail("New_Role", role.to_string());
                if let Some(target) = target {
                    event = event.with_target_user(target);
                }
                self.notifier.notify(event).await;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(AppError::RedirectToLogin),
            Err(e) => {
                self.message = Some(Message::error(e.display_message("Failed to update role")));
                Ok(())
            }
        }
    }

    /// Log out: best-effort audit event, then session teardown. Idempotent.
    pub async fn logout(&mut self) -> AppResult<()> {
        let actor = self
            .state
            .ready()
            .map(|data| data.current.email.clone())
            .unwrap_or_else(|| "unknown".to_string());
        self.notifier
            .notify(AuditEvent::new(actor.clone(), actions::USER_LOGOUT).with_target_user(actor))
            .await;

        self.client.session().teardown().map_err(AppError::Client)?;
        Ok(())
    }
}
