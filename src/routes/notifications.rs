//! Follow-up notification routes.
//!
//! GET /notifications/follow-ups?workerId= - Guests overdue for contact

use axum::extract::Query;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::AnalyticsService;
use crate::error::AppError;
use crate::models::{ApiResponse, FollowUpNotice};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpQuery {
    pub worker_id: Option<Uuid>,
}

/// Build the notifications router.
pub fn router() -> Router {
    Router::new().route("/notifications/follow-ups", get(follow_ups))
}

async fn follow_ups(
    Extension(service): Extension<AnalyticsService>,
    Query(query): Query<FollowUpQuery>,
) -> Result<Json<ApiResponse<Vec<FollowUpNotice>>>, AppError> {
    let notices = service.follow_ups(query.worker_id, Utc::now()).await?;

    Ok(Json(ApiResponse {
        message: format!("{} guests need follow-up", notices.len()),
        data: notices,
    }))
}
