//! Storage port for the analytics service.
//!
//! The engines never see storage; [`crate::analytics::AnalyticsService`] pulls
//! records through this trait and hands the engines plain slices.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{Engagement, Guest, User, UserRole, Zone};

#[derive(Debug, Clone, Default)]
pub struct GuestFilter {
    pub zone_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct EngagementFilter {
    pub worker_id: Option<Uuid>,
    /// Only engagements at or after this instant. Undated records are dropped.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub zone_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub active_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneFilter {
    pub zone_id: Option<Uuid>,
}

impl GuestFilter {
    pub fn matches(&self, guest: &Guest) -> bool {
        self.zone_id.map_or(true, |id| guest.zone_id == Some(id))
            && self
                .assigned_to_id
                .map_or(true, |id| guest.assigned_to_id == Some(id))
    }
}

impl EngagementFilter {
    pub fn matches(&self, engagement: &Engagement) -> bool {
        self.worker_id.map_or(true, |id| engagement.worker_id == id)
            && self.since.map_or(true, |since| {
                engagement.occurred_at().is_some_and(|at| at >= since)
            })
    }
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.zone_id.map_or(true, |id| user.zone_ids.contains(&id))
            && self.role.map_or(true, |role| user.role == role)
            && (!self.active_only || user.is_active)
    }
}

impl ZoneFilter {
    pub fn matches(&self, zone: &Zone) -> bool {
        self.zone_id.map_or(true, |id| zone.id == id)
    }
}

/// Read access to CRM records. Results preserve storage order so reports
/// built from them are deterministic.
#[async_trait]
pub trait CrmRepository: Send + Sync {
    /// Guests with their milestones attached.
    async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>, RepositoryError>;

    async fn find_engagements(
        &self,
        filter: &EngagementFilter,
    ) -> Result<Vec<Engagement>, RepositoryError>;

    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    async fn find_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>, RepositoryError>;
}

pub type SharedRepository = Arc<dyn CrmRepository>;
