//! Users resource group: the caller's profile, avatar upload, and the
//! admin-only user list and role management

use opsdeck_core::{OpsdeckResult, ProfileUpdate, Role, RoleUpdate, UserProfile};
use reqwest::Method;
use tracing::info;

use super::ApiClient;

impl ApiClient {
    /// Fetch the caller's own profile
    pub async fn get_me(&self) -> OpsdeckResult<UserProfile> {
        let response = self
            .execute(self.request(Method::GET, "/users/me"), "get_me")
            .await?;
        self.receive_json(response, "get_me").await
    }

    /// Update the caller's profile fields, returning the server's
    /// representation
    pub async fn update_me(&self, update: &ProfileUpdate) -> OpsdeckResult<UserProfile> {
        let response = self
            .execute(
                self.request(Method::PUT, "/users/me").json(update),
                "update_me",
            )
            .await?;
        self.receive_json(response, "update_me").await
    }

    /// Upload an avatar image. This is the one multipart operation; the
    /// backend stores the file and returns the profile with the new
    /// avatar reference.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> OpsdeckResult<UserProfile> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .execute(
                self.request(Method::POST, "/users/avatar").multipart(form),
                "upload_avatar",
            )
            .await?;
        self.receive_json(response, "upload_avatar").await
    }

    /// List all users (admin)
    pub async fn list_users(&self) -> OpsdeckResult<Vec<UserProfile>> {
        let response = self
            .execute(self.request(Method::GET, "/users/"), "list_users")
            .await?;
        self.receive_json(response, "list_users").await
    }

    /// Change a user's role (admin), returning the updated record
    pub async fn update_role(&self, user_id: i64, role: Role) -> OpsdeckResult<UserProfile> {
        let body = RoleUpdate { role };
        let response = self
            .execute(
                self.request(Method::PUT, &format!("/users/{}/role", user_id))
                    .json(&body),
                "update_role",
            )
            .await?;
        let updated: UserProfile = self.receive_json(response, "update_role").await?;
        info!(user_id, role = %role, "Role updated");
        Ok(updated)
    }
}
