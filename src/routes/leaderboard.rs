//! Leaderboard routes.
//!
//! GET /leaderboard/workers?period=&zoneId=&limit= - Workers ranked by points
//! GET /leaderboard/zones?period=&limit=           - Zones ranked by points

use axum::extract::Query;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::AnalyticsService;
use crate::error::AppError;
use crate::models::{ApiResponse, WorkerLeaderboardEntry, ZoneLeaderboardEntry};
use crate::period::Period;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub period: Option<String>,
    pub zone_id: Option<Uuid>,
    pub limit: Option<usize>,
}

/// Build the leaderboard router.
pub fn router() -> Router {
    Router::new()
        .route("/leaderboard/workers", get(worker_leaderboard))
        .route("/leaderboard/zones", get(zone_leaderboard))
}

async fn worker_leaderboard(
    Extension(service): Extension<AnalyticsService>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<WorkerLeaderboardEntry>>>, AppError> {
    let period = Period::from_token(query.period.as_deref());
    let entries = service
        .worker_leaderboard(period, query.zone_id, query.limit, Utc::now())
        .await?;

    Ok(Json(ApiResponse {
        data: entries,
        message: "Worker leaderboard generated".to_string(),
    }))
}

/// The zone leaderboard always spans every zone; `zoneId` is ignored.
async fn zone_leaderboard(
    Extension(service): Extension<AnalyticsService>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<ZoneLeaderboardEntry>>>, AppError> {
    let period = Period::from_token(query.period.as_deref());
    let entries = service.zone_leaderboard(period, query.limit, Utc::now()).await?;

    Ok(Json(ApiResponse {
        data: entries,
        message: "Zone leaderboard generated".to_string(),
    }))
}
