//! Dashboard summary endpoints

use serde::{Deserialize, Serialize};

use crate::api::{serde_ext, ApiClient};
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub music_count: i64,
    #[serde(default)]
    pub books_count: i64,
    #[serde(default, deserialize_with = "serde_ext::lenient_f64")]
    pub expenses_total: f64,
    #[serde(default)]
    pub goals_completion_rate: f64,
}

/// Entry of the recent activity feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Dashboard endpoints
pub struct DashboardApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.client
            .get("/api/dashboard/stats", "Failed to fetch dashboard stats")
            .await
    }

    pub async fn recent_activity(&self) -> Result<Vec<Activity>> {
        self.client
            .get("/api/dashboard/recent-activity", "Failed to fetch recent activity")
            .await
    }

    /// Stats and activity fetched concurrently; fails if either fails
    pub async fn overview(&self) -> Result<(DashboardStats, Vec<Activity>)> {
        futures::future::try_join(self.stats(), self.recent_activity()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticToken;
    use crate::error::ApiError;
    use crate::testing::spawn_server;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_overview() {
        let app = Router::new()
            .route(
                "/api/dashboard/stats",
                get(|| async { Json(json!({ "data": { "music_count": 12, "expenses_total": "40.5" } })) }),
            )
            .route(
                "/api/dashboard/recent-activity",
                get(|| async {
                    Json(json!([{ "type": "book", "description": "Started Dune", "created_at": "2024-01-01" }]))
                }),
            );
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("t")));

        let (stats, activity) = DashboardApi::new(&client).overview().await.unwrap();
        assert_eq!(stats.music_count, 12);
        assert_eq!(stats.expenses_total, 40.5);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].kind, "book");
    }

    #[tokio::test]
    async fn test_overview_fails_when_one_part_fails() {
        let app = Router::new()
            .route(
                "/api/dashboard/stats",
                get(|| async { Json(json!({ "music_count": 1 })) }),
            )
            .route(
                "/api/dashboard/recent-activity",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" }))) }),
            );
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("t")));

        let err = DashboardApi::new(&client).overview().await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
