//! In-process repository used by tests and `APP_STORAGE=memory` runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CrmRepository, EngagementFilter, GuestFilter, UserFilter, ZoneFilter};
use crate::error::RepositoryError;
use crate::models::{Engagement, Guest, User, Zone};

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    guests: RwLock<Vec<Guest>>,
    engagements: RwLock<Vec<Engagement>>,
    users: RwLock<Vec<User>>,
    zones: RwLock<Vec<Zone>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_guest(&self, guest: Guest) {
        self.guests.write().await.push(guest);
    }

    pub async fn insert_engagement(&self, engagement: Engagement) {
        self.engagements.write().await.push(engagement);
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.push(user);
    }

    pub async fn insert_zone(&self, zone: Zone) {
        self.zones.write().await.push(zone);
    }
}

#[async_trait]
impl CrmRepository for InMemoryRepository {
    async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>, RepositoryError> {
        let guests = self.guests.read().await;
        Ok(guests.iter().filter(|g| filter.matches(g)).cloned().collect())
    }

    async fn find_engagements(
        &self,
        filter: &EngagementFilter,
    ) -> Result<Vec<Engagement>, RepositoryError> {
        let engagements = self.engagements.read().await;
        Ok(engagements
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| filter.matches(u)).cloned().collect())
    }

    async fn find_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>, RepositoryError> {
        let zones = self.zones.read().await;
        Ok(zones.iter().filter(|z| filter.matches(z)).cloned().collect())
    }
}
