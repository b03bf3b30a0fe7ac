//! Auth resource group: login and registration

use opsdeck_core::{LoginRequest, OpsdeckResult, RegisterRequest, TokenResponse, UserProfile};
use reqwest::Method;
use tracing::info;

use super::ApiClient;

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// On success the token is written into the session context, creating
    /// the session.
    pub async fn login(&self, email: &str, password: &str) -> OpsdeckResult<TokenResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .execute(
                self.request(Method::POST, "/auth/login").json(&body),
                "login",
            )
            .await?;
        let token: TokenResponse = self.receive_json(response, "login").await?;

        self.session().establish(&token.access_token)?;
        info!(email, "Logged in");

        Ok(token)
    }

    /// Create an account. Does not establish a session; callers log in
    /// separately afterwards.
    pub async fn register(&self, request: &RegisterRequest) -> OpsdeckResult<UserProfile> {
        let response = self
            .execute(
                self.request(Method::POST, "/auth/register").json(request),
                "register",
            )
            .await?;
        self.receive_json(response, "register").await
    }
}
