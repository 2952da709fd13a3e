//! Scoring and reporting engines.
//!
//! Every engine here is a pure function of a [`Snapshot`] and a caller-supplied
//! `now`. Nothing is cached between calls; identical inputs give identical
//! outputs. [`AnalyticsService`] is the only piece that touches the repository.

pub mod followup;
pub mod funnel;
pub mod report;
pub mod service;
pub mod worker;
pub mod zone;

pub use followup::FollowUpPolicy;
pub use funnel::{FunnelReport, StageFunnelAnalyzer};
pub use report::ReportBuilder;
pub use service::AnalyticsService;
pub use worker::WorkerScoringEngine;
pub use zone::ZoneScoringEngine;

use crate::models::{Engagement, Guest, User, Zone};

/// Read-only view of the records a report is computed from.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub guests: &'a [Guest],
    pub engagements: &'a [Engagement],
    pub users: &'a [User],
    pub zones: &'a [Zone],
}

/// `round(100 * part / whole)` clamped to `[0, 100]`; `0` when `whole` is `0`.
pub(crate) fn percent(part: i64, whole: i64) -> u32 {
    if whole <= 0 {
        return 0;
    }
    let pct = (100.0 * part as f64 / whole as f64).round();
    pct.clamp(0.0, 100.0) as u32
}

pub(crate) fn count<T>(items: impl Iterator<Item = T>) -> u32 {
    u32::try_from(items.count()).unwrap_or(u32::MAX)
}
