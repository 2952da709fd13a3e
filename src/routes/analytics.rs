//! Analytics report routes.
//!
//! GET /analytics?period=&zoneId= - Funnel, trends, zone performance and top performers

use axum::extract::Query;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::AnalyticsService;
use crate::error::AppError;
use crate::models::{AnalyticsReport, ApiResponse};
use crate::period::Period;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub zone_id: Option<Uuid>,
}

/// Build the analytics router.
pub fn router() -> Router {
    Router::new().route("/analytics", get(get_analytics))
}

async fn get_analytics(
    Extension(service): Extension<AnalyticsService>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsReport>>, AppError> {
    let period = Period::from_token(query.period.as_deref());
    let report = service.report(period, query.zone_id, Utc::now()).await?;

    Ok(Json(ApiResponse {
        data: report,
        message: "Analytics report generated".to_string(),
    }))
}
