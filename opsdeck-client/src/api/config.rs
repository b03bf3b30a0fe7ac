//! Config resource group: system configuration entries

use opsdeck_core::{ConfigEntry, ConfigUpdate, OpsdeckResult};
use reqwest::Method;
use tracing::info;

use super::ApiClient;

impl ApiClient {
    /// List all configuration entries (admin)
    pub async fn list_configs(&self) -> OpsdeckResult<Vec<ConfigEntry>> {
        let response = self
            .execute(self.request(Method::GET, "/config/"), "list_configs")
            .await?;
        self.receive_json(response, "list_configs").await
    }

    /// Fetch a single entry
    pub async fn get_config(&self, key: &str) -> OpsdeckResult<ConfigEntry> {
        let response = self
            .execute(
                self.request(Method::GET, &format!("/config/{}", key)),
                "get_config",
            )
            .await?;
        self.receive_json(response, "get_config").await
    }

    /// Update an entry's value and description. The body carries that
    /// entry's key, value, and description only.
    pub async fn update_config(&self, update: &ConfigUpdate) -> OpsdeckResult<ConfigEntry> {
        let response = self
            .execute(
                self.request(Method::PUT, &format!("/config/{}", update.key))
                    .json(update),
                "update_config",
            )
            .await?;
        let entry: ConfigEntry = self.receive_json(response, "update_config").await?;
        info!(key = %entry.key, "Config entry updated");
        Ok(entry)
    }
}
