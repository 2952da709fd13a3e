//! HTTP route modules for the guest follow-up service.
//!
//! - `analytics`: dashboard-wide analytics report
//! - `leaderboard`: worker and zone leaderboards
//! - `notifications`: overdue follow-up notices
//! - `health`: liveness probe

pub mod analytics;
pub mod health;
pub mod leaderboard;
pub mod notifications;
