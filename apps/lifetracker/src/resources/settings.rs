//! Profile and preference endpoints

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::Result;

/// User profile with preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_theme")]
    pub theme_preference: String,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub enable_email_notifications: bool,
    #[serde(default)]
    pub enable_goal_reminders: bool,
    #[serde(default)]
    pub enable_push_notifications: bool,
    #[serde(default)]
    pub two_factor_enabled: bool,
}

fn default_theme() -> String {
    "system".to_string()
}

/// Settings endpoints
pub struct SettingsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SettingsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.client
            .get("/api/settings/profile", "Failed to fetch profile")
            .await
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.client
            .send(Method::PUT, "/api/settings/profile", profile, "Failed to update profile")
            .await
    }
}
