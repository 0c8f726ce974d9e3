//! Goal endpoints

use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    #[serde(other)]
    Other,
}

/// What a goal counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Books,
    Music,
    Expenses,
    #[default]
    #[serde(other)]
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub goal_type: GoalType,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub progress: f64,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub target: f64,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl Goal {
    /// Rounded completion percentage; zero when there is no target
    pub fn percent_complete(&self) -> u32 {
        if self.target > 0.0 {
            ((self.progress / self.target) * 100.0).round().max(0.0) as u32
        } else {
            0
        }
    }

    /// "Progress: 3 of 12 books" style summary
    pub fn progress_label(&self) -> String {
        match self.goal_type {
            GoalType::Books => format!("Progress: {} of {} books", self.progress, self.target),
            GoalType::Music => format!("Progress: {} of {} songs", self.progress, self.target),
            GoalType::Expenses => format!("Progress: ${} of ${}", self.progress, self.target),
            GoalType::Custom => format!("Progress: {} of {}", self.progress, self.target),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: f64,
    pub priority: Option<String>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalStats {
    #[serde(default)]
    pub active_goals: i64,
    #[serde(default)]
    pub completed_goals: i64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub overdue_goals: i64,
}

#[derive(Serialize)]
struct ProgressBody {
    progress: f64,
}

/// Goal endpoints
pub struct GoalsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> GoalsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<GoalStats> {
        self.client.get("/api/goals/stats", "Failed to fetch goal stats").await
    }

    pub async fn list(&self) -> Result<Vec<Goal>> {
        self.client.get("/api/goals", "Failed to fetch goals").await
    }

    pub async fn create(&self, goal: &NewGoal) -> Result<Goal> {
        if goal.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".into()));
        }
        self.client
            .send(Method::POST, "/api/goals", goal, "Failed to create goal")
            .await
    }

    pub async fn update_progress(&self, id: &str, progress: f64) -> Result<Goal> {
        self.client
            .send(
                Method::PUT,
                &format!("/api/goals/{}/progress", id),
                &ProgressBody { progress },
                "Failed to update goal progress",
            )
            .await
    }

    /// Mark a goal complete by setting its progress to the target
    pub async fn complete(&self, goal: &Goal) -> Result<Goal> {
        self.update_progress(&goal.id, goal.target).await
    }
}
