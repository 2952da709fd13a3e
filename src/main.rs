//! # Guest Follow-up Service
//!
//! Serves assimilation-funnel analytics, worker and zone leaderboards, and
//! follow-up notices for a church guest CRM.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - SQLx reads guests, engagements, users and zones from PostgreSQL
//! - Scoring engines are pure functions over a per-request snapshot

use tracing::info;

use guest_followup::analytics::FollowUpPolicy;
use guest_followup::config::AppConfig;
use guest_followup::{create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guest_followup=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting guest follow-up service");

    let config = AppConfig::from_env()?;
    let repository = db::connect(&config).await?;

    let app = create_app(
        repository,
        FollowUpPolicy::new(config.follow_up_after_days),
    );

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
