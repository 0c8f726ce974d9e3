//! Insight endpoints

use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightStats {
    #[serde(default)]
    pub activity_score: f64,
    #[serde(default)]
    pub activity_change: f64,
    #[serde(default)]
    pub most_active_day: Option<String>,
    #[serde(default)]
    pub streak_days: i64,
    #[serde(default)]
    pub productivity_rate: f64,
    #[serde(default)]
    pub music_count: i64,
    #[serde(default)]
    pub books_count: i64,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub expenses_total: f64,
    #[serde(default)]
    pub completed_goals: i64,
    #[serde(default)]
    pub total_goals: i64,
}

/// Generated insight card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Insight endpoints
pub struct InsightsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> InsightsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<InsightStats> {
        self.client.get("/api/insights/stats", "Failed to fetch insight stats").await
    }

    pub async fn list(&self) -> Result<Vec<Insight>> {
        self.client.get("/api/insights", "Failed to fetch insights").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_defaults() {
        let stats: InsightStats =
            serde_json::from_value(json!({ "streak_days": 4, "expenses_total": "19.99" })).unwrap();
        assert_eq!(stats.streak_days, 4);
        assert_eq!(stats.expenses_total, 19.99);
        assert_eq!(stats.most_active_day, None);
    }
}
