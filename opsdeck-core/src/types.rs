//! Domain types shared across the workspace
//!
//! These mirror the backend's wire representations: users, configuration
//! entries, the role/capability model, and the auth request/response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access tier governing which views and data a user may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Viewer,
}

impl Role {
    /// Whether this role grants a capability.
    ///
    /// The client-side check is advisory only; the backend enforces the
    /// same rules authoritatively on every request.
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::User => matches!(capability, ViewOwnProfile | EditOwnProfile),
            Role::Viewer => matches!(capability, ViewOwnProfile),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "viewer" => Ok(Role::Viewer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Specific capabilities that a role may grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// View the system configuration list
    ViewConfig,
    /// Edit configuration entries
    EditConfig,
    /// View the user list
    ViewUsers,
    /// Change other users' roles
    ChangeRoles,
    /// View the caller's own profile
    ViewOwnProfile,
    /// Edit the caller's own profile
    EditOwnProfile,
}

/// Identity record for a user, as returned by the backend.
///
/// The client holds a transient cached copy per view; it is discarded on
/// navigation away and re-fetched on the next mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Editable subset of the profile, sent with PUT /users/me.
///
/// Email, role, and activation status are never client-editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

impl ProfileUpdate {
    /// Pre-fill the form from a fetched snapshot.
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            phone: profile.phone.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            country: profile.country.clone(),
            department: profile.department.clone(),
            job_title: profile.job_title.clone(),
            date_of_birth: profile.date_of_birth.clone(),
        }
    }
}

/// A named, described, string-valued system setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of PUT /config/{key}: the entry's key, value, and description only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&ConfigEntry> for ConfigUpdate {
    fn from(entry: &ConfigEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            description: entry.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response of POST /auth/login: the opaque bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Body of PUT /users/{id}/role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}
