//! Admin view behavior against a live mock backend

mod support;

use std::sync::Arc;

use opsdeck_app::audit::actions;
use opsdeck_app::{AdminView, AppError};
use opsdeck_core::Role;
use support::{logged_in_client, spawn_backend, Backend, RecordingNotifier};

#[tokio::test]
async fn admin_mount_fetches_configs_and_users() {
    let (base, state) = spawn_backend(Backend::with_admin()).await;
    let (client, _session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let view = AdminView::mount(client, notifier).await.unwrap();

    let data = view.state().ready().unwrap();
    assert_eq!(data.current.email, "admin@example.com");
    assert_eq!(data.configs.len(), 2);
    assert_eq!(data.users.len(), 3);

    let counters = state.lock().unwrap().counters.clone();
    assert_eq!(counters.config_list, 1);
    assert_eq!(counters.users_list, 1);
}

#[tokio::test]
async fn non_admin_is_denied_without_any_data_fetch() {
    let (base, state) = spawn_backend(Backend::with_regular_user()).await;
    let (client, session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let view = AdminView::mount(client, notifier).await.unwrap();

    assert!(view.state().is_access_denied());
    assert_eq!(view.message().unwrap().text, "Admin access required");
    // Denial is client-side only: the session survives
    assert!(session.is_authenticated());

    let counters = state.lock().unwrap().counters.clone();
    assert_eq!(counters.config_list, 0);
    assert_eq!(counters.users_list, 0);
}

#[tokio::test]
async fn mount_with_rejected_token_redirects() {
    let (base, _state) = spawn_backend(Backend::with_admin()).await;
    let session = opsdeck_client::SessionContext::in_memory();
    session.establish("stale-token").unwrap();
    let client = opsdeck_client::ApiClient::new(
        opsdeck_client::ApiClientConfig::default().with_base_url(&base),
        session.clone(),
    )
    .unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    let result = AdminView::mount(client, notifier).await;

    assert!(matches!(result, Err(AppError::RedirectToLogin)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn editing_one_config_leaves_others_untouched() {
    let (base, _state) = spawn_backend(Backend::with_admin()).await;
    let (client, _session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let mut view = AdminView::mount(client, notifier).await.unwrap();
    view.edit_config_value("theme", "light");

    let data = view.state().ready().unwrap();
    let theme = data.configs.iter().find(|c| c.key == "theme").unwrap();
    let app_name = data.configs.iter().find(|c| c.key == "app_name").unwrap();
    assert_eq!(theme.value, "light");
    assert_eq!(app_name.value, "Opsdeck");
}

#[tokio::test]
async fn save_config_sends_key_value_description_only() {
    let (base, state) = spawn_backend(Backend::with_admin()).await;
    let (client, _session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let mut view = AdminView::mount(client, notifier.clone()).await.unwrap();
    view.edit_config_value("theme", "light");
    view.save_config("theme").await.unwrap();

    assert_eq!(view.message().unwrap().text, "theme saved!");
    assert!(view.message().unwrap().is_success());
    {
        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, actions::CONFIG_CHANGE);
        assert_eq!(events[0].details.get("Config_Key").map(String::as_str), Some("theme"));
        assert_eq!(events[0].details.get("Old_Value").map(String::as_str), Some("dark"));
        assert_eq!(events[0].details.get("New_Value").map(String::as_str), Some("light"));
    }

    let state = state.lock().unwrap();
    assert_eq!(state.counters.config_updates, 1);
    let body = state.last_config_body.as_ref().unwrap();
    let fields = body.as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(body["key"], "theme");
    assert_eq!(body["value"], "light");
    assert_eq!(body["description"], "UI theme");
}

#[tokio::test]
async fn role_change_updates_row_and_audits() {
    let (base, state) = spawn_backend(Backend::with_admin()).await;
    let (client, _session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let mut view = AdminView::mount(client, notifier.clone()).await.unwrap();
    view.change_role(2, Role::Admin).await.unwrap();

    let data = view.state().ready().unwrap();
    let row = data.users.iter().find(|u| u.id == 2).unwrap();
    assert_eq!(row.role, Role::Admin);
    assert!(view.message().unwrap().is_success());
    assert_eq!(state.lock().unwrap().counters.role_updates, 1);

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, actions::UPDATE_USER_ROLE);
    assert_eq!(events[0].target_user.as_deref(), Some("user@example.com"));
    assert_eq!(events[0].details.get("New_Role").map(String::as_str), Some("admin"));
}

#[tokio::test]
async fn failed_role_change_leaves_list_unchanged() {
    let mut backend = Backend::with_admin();
    backend.fail_role_update = Some((400, "Invalid role"));
    let (base, _state) = spawn_backend(backend).await;
    let (client, session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let mut view = AdminView::mount(client, notifier.clone()).await.unwrap();
    view.change_role(2, Role::Admin).await.unwrap();

    let data = view.state().ready().unwrap();
    let row = data.users.iter().find(|u| u.id == 2).unwrap();
    assert_eq!(row.role, Role::User);
    let message = view.message().unwrap();
    assert!(!message.is_success());
    assert_eq!(message.text, "Invalid role");
    // Business error, not an auth failure: session intact
    assert!(session.is_authenticated());
    assert!(notifier.actions().is_empty());
}

#[tokio::test]
async fn own_row_is_rejected_without_a_request() {
    let (base, state) = spawn_backend(Backend::with_admin()).await;
    let (client, _session) = logged_in_client(&base);
    let notifier = Arc::new(RecordingNotifier::default());

    let mut view = AdminView::mount(client, notifier.clone()).await.unwrap();

    assert!(!view.role_control_enabled(1));
    assert!(view.role_control_enabled(2));

    view.change_role(1, Role::Viewer).await.unwrap();

    assert_eq!(view.message().unwrap().text, "Cannot change your own role");
    assert_eq!(state.lock().unwrap().counters.role_updates, 0);
    let data = view.state().ready().unwrap();
    assert_eq!(data.users.iter().find(|u| u.id == 1).unwrap().role, Role::Admin);
    assert!(notifier.actions().is_empty());
}
