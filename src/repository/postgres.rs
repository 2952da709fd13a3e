//! PostgreSQL-backed repository.
//!
//! Rows are read into `sqlx::FromRow` structs with raw text columns and then
//! converted into domain types. A row whose stage, status, role or channel is
//! not recognised is logged and skipped so one bad record cannot sink a
//! whole report.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CrmRepository, EngagementFilter, GuestFilter, UserFilter, ZoneFilter};
use crate::error::{ParseError, RepositoryError};
use crate::models::{Engagement, Guest, Milestone, User, Zone};

// ============================================================================
// Row Models (sqlx::FromRow)
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GuestRow {
    id: Uuid,
    name: String,
    created_by_id: Option<Uuid>,
    assigned_to_id: Option<Uuid>,
    zone_id: Option<Uuid>,
    assimilation_stage: String,
    last_contact: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct MilestoneRow {
    id: Uuid,
    guest_id: Uuid,
    title: String,
    status: String,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct EngagementRow {
    id: Uuid,
    guest_id: Uuid,
    worker_id: Uuid,
    engagement_type: String,
    notes: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    role: String,
    zone_ids: Vec<Uuid>,
    is_active: bool,
    guest_count: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct ZoneRow {
    id: Uuid,
    name: String,
    coordinator_id: Option<Uuid>,
}

impl TryFrom<GuestRow> for Guest {
    type Error = ParseError;

    fn try_from(row: GuestRow) -> Result<Self, Self::Error> {
        Ok(Guest {
            id: row.id,
            name: row.name,
            created_by_id: row.created_by_id,
            assigned_to_id: row.assigned_to_id,
            zone_id: row.zone_id,
            assimilation_stage: row.assimilation_stage.parse()?,
            last_contact: row.last_contact,
            created_at: row.created_at,
            milestones: Vec::new(),
        })
    }
}

impl TryFrom<MilestoneRow> for Milestone {
    type Error = ParseError;

    fn try_from(row: MilestoneRow) -> Result<Self, Self::Error> {
        Ok(Milestone {
            id: row.id,
            guest_id: row.guest_id,
            title: row.title,
            status: row.status.parse()?,
            completed_at: row.completed_at,
        })
    }
}

impl TryFrom<EngagementRow> for Engagement {
    type Error = ParseError;

    fn try_from(row: EngagementRow) -> Result<Self, Self::Error> {
        Ok(Engagement {
            id: row.id,
            guest_id: row.guest_id,
            worker_id: row.worker_id,
            engagement_type: row.engagement_type.parse()?,
            notes: row.notes,
            timestamp: row.timestamp,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = ParseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            role: row.role.parse()?,
            zone_ids: row.zone_ids,
            is_active: row.is_active,
            guest_count: u32::try_from(row.guest_count).unwrap_or(0),
        })
    }
}

impl From<ZoneRow> for Zone {
    fn from(row: ZoneRow) -> Self {
        Zone {
            id: row.id,
            name: row.name,
            coordinator_id: row.coordinator_id,
        }
    }
}

/// Convert rows, dropping (and logging) the ones that do not parse.
fn convert_rows<R, T>(table: &'static str, rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = ParseError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(table, error = %e, "Skipping malformed row");
                None
            }
        })
        .collect()
}

// ============================================================================
// Repository
// ============================================================================

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema under `migrations/`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn milestones_for(&self, guest_ids: &[Uuid]) -> Result<Vec<Milestone>, RepositoryError> {
        let rows: Vec<MilestoneRow> = sqlx::query_as(
            r#"
            SELECT id, guest_id, title, status, completed_at
            FROM milestones
            WHERE guest_id = ANY($1)
            ORDER BY guest_id, position
            "#,
        )
        .bind(guest_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(convert_rows("milestones", rows))
    }
}

#[async_trait]
impl CrmRepository for PgRepository {
    async fn find_guests(&self, filter: &GuestFilter) -> Result<Vec<Guest>, RepositoryError> {
        let rows: Vec<GuestRow> = sqlx::query_as(
            r#"
            SELECT id, name, created_by_id, assigned_to_id, zone_id,
                   assimilation_stage, last_contact, created_at
            FROM guests
            WHERE ($1::uuid IS NULL OR zone_id = $1)
              AND ($2::uuid IS NULL OR assigned_to_id = $2)
            ORDER BY created_at NULLS LAST, id
            "#,
        )
        .bind(filter.zone_id)
        .bind(filter.assigned_to_id)
        .fetch_all(&self.pool)
        .await?;

        let mut guests: Vec<Guest> = convert_rows("guests", rows);
        let ids: Vec<Uuid> = guests.iter().map(|g| g.id).collect();

        let mut by_guest: HashMap<Uuid, Vec<Milestone>> = HashMap::new();
        for milestone in self.milestones_for(&ids).await? {
            by_guest.entry(milestone.guest_id).or_default().push(milestone);
        }
        for guest in &mut guests {
            guest.milestones = by_guest.remove(&guest.id).unwrap_or_default();
        }

        debug!(count = guests.len(), "Loaded guests");
        Ok(guests)
    }

    async fn find_engagements(
        &self,
        filter: &EngagementFilter,
    ) -> Result<Vec<Engagement>, RepositoryError> {
        let rows: Vec<EngagementRow> = sqlx::query_as(
            r#"
            SELECT id, guest_id, worker_id, "type" AS engagement_type, notes,
                   "timestamp", created_at
            FROM engagements
            WHERE ($1::uuid IS NULL OR worker_id = $1)
              AND ($2::timestamptz IS NULL OR COALESCE("timestamp", created_at) >= $2)
            ORDER BY COALESCE("timestamp", created_at) NULLS LAST, id
            "#,
        )
        .bind(filter.worker_id)
        .bind(filter.since)
        .fetch_all(&self.pool)
        .await?;

        let engagements: Vec<Engagement> = convert_rows("engagements", rows);
        debug!(count = engagements.len(), "Loaded engagements");
        Ok(engagements)
    }

    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, role, zone_ids, is_active, guest_count
            FROM users
            WHERE ($1::uuid IS NULL OR $1 = ANY(zone_ids))
              AND ($2::text IS NULL OR role = $2)
              AND (NOT $3 OR is_active)
            ORDER BY name, id
            "#,
        )
        .bind(filter.zone_id)
        .bind(filter.role.map(|role| role.as_str()))
        .bind(filter.active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(convert_rows("users", rows))
    }

    async fn find_zones(&self, filter: &ZoneFilter) -> Result<Vec<Zone>, RepositoryError> {
        let rows: Vec<ZoneRow> = sqlx::query_as(
            r#"
            SELECT id, name, coordinator_id
            FROM zones
            WHERE ($1::uuid IS NULL OR id = $1)
            ORDER BY name, id
            "#,
        )
        .bind(filter.zone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Zone::from).collect())
    }
}
