//! # Guest Follow-up Service Library
//!
//! Exposes the Axum router and modules so integration tests can create
//! an in-process server backed by any [`repository::CrmRepository`].

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod period;
pub mod repository;
pub mod routes;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analytics::{AnalyticsService, FollowUpPolicy};
use crate::repository::SharedRepository;

/// Build the Axum router with all route modules and middleware.
///
/// The caller supplies a connected repository. This function does NOT
/// start a server.
pub fn create_app(repository: SharedRepository, follow_up: FollowUpPolicy) -> Router {
    let service = AnalyticsService::new(repository, follow_up);

    Router::new()
        .merge(routes::analytics::router())
        .merge(routes::leaderboard::router())
        .merge(routes::notifications::router())
        .merge(routes::health::router())
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
