//! Loads snapshots through the repository and runs the engines over them.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{FollowUpPolicy, ReportBuilder, Snapshot, WorkerScoringEngine, ZoneScoringEngine};
use crate::error::AppError;
use crate::models::{
    AnalyticsReport, Engagement, FollowUpNotice, Guest, User, WorkerLeaderboardEntry, Zone,
    ZoneLeaderboardEntry,
};
use crate::period::Period;
use crate::repository::{EngagementFilter, GuestFilter, SharedRepository, UserFilter, ZoneFilter};

/// Records for one request. Each collection is read separately, so they may
/// reflect slightly different moments if the store is written to meanwhile.
struct OwnedSnapshot {
    guests: Vec<Guest>,
    engagements: Vec<Engagement>,
    users: Vec<User>,
    zones: Vec<Zone>,
}

impl OwnedSnapshot {
    fn view(&self) -> Snapshot<'_> {
        Snapshot {
            guests: &self.guests,
            engagements: &self.engagements,
            users: &self.users,
            zones: &self.zones,
        }
    }
}

/// Run an engine off the async runtime. A panic inside the engine is a
/// defect and comes back as [`AppError::Internal`].
async fn compute<T, F>(snapshot: OwnedSnapshot, engine: F) -> Result<T, AppError>
where
    F: FnOnce(Snapshot<'_>) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || engine(snapshot.view()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: SharedRepository,
    follow_up: FollowUpPolicy,
}

impl AnalyticsService {
    pub fn new(repository: SharedRepository, follow_up: FollowUpPolicy) -> Self {
        Self {
            repository,
            follow_up,
        }
    }

    /// Engagements are loaded from the start of the previous window so trend
    /// comparisons have both periods available.
    async fn load(
        &self,
        period: Period,
        guest_filter: GuestFilter,
        zone_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<OwnedSnapshot, AppError> {
        let guests = self.repository.find_guests(&guest_filter).await?;
        let engagements = self
            .repository
            .find_engagements(&EngagementFilter {
                worker_id: None,
                since: Some(period.previous_window(now).start),
            })
            .await?;
        let users = self
            .repository
            .find_users(&UserFilter {
                zone_id,
                ..UserFilter::default()
            })
            .await?;
        let zones = self.repository.find_zones(&ZoneFilter { zone_id }).await?;

        Ok(OwnedSnapshot {
            guests,
            engagements,
            users,
            zones,
        })
    }

    pub async fn report(
        &self,
        period: Period,
        zone_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, AppError> {
        let guest_filter = GuestFilter {
            zone_id,
            ..GuestFilter::default()
        };
        let snapshot = self.load(period, guest_filter, zone_id, now).await?;
        let report = compute(snapshot, move |view| {
            ReportBuilder::new(period, now).build(&view)
        })
        .await?;

        info!(
            ?period,
            ?zone_id,
            total_guests = report.total_guests,
            "Analytics report generated"
        );
        Ok(report)
    }

    /// Workers are restricted to the zone; their stats count every guest
    /// they captured or were assigned, wherever it lives.
    pub async fn worker_leaderboard(
        &self,
        period: Period,
        zone_id: Option<Uuid>,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkerLeaderboardEntry>, AppError> {
        let snapshot = self.load(period, GuestFilter::default(), zone_id, now).await?;
        let mut entries = compute(snapshot, move |view| {
            WorkerScoringEngine::new(period, now).leaderboard(&view)
        })
        .await?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        info!(?period, ?zone_id, workers = entries.len(), "Worker leaderboard generated");
        Ok(entries)
    }

    pub async fn zone_leaderboard(
        &self,
        period: Period,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ZoneLeaderboardEntry>, AppError> {
        let snapshot = self.load(period, GuestFilter::default(), None, now).await?;
        let mut entries = compute(snapshot, move |view| {
            ZoneScoringEngine::new(period, now).leaderboard(&view)
        })
        .await?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        info!(?period, zones = entries.len(), "Zone leaderboard generated");
        Ok(entries)
    }

    pub async fn follow_ups(
        &self,
        worker_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<FollowUpNotice>, AppError> {
        let guests = self
            .repository
            .find_guests(&GuestFilter {
                assigned_to_id: worker_id,
                ..GuestFilter::default()
            })
            .await?;
        let notices = self.follow_up.overdue(&guests, worker_id, now);

        info!(?worker_id, notices = notices.len(), "Follow-up notices generated");
        Ok(notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{AssimilationStage, UserRole};
    use crate::repository::InMemoryRepository;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn seeded() -> (Arc<InMemoryRepository>, Uuid, Uuid) {
        let repo = Arc::new(InMemoryRepository::new());
        let north = Uuid::new_v4();
        let south = Uuid::new_v4();
        for (id, name) in [(north, "North"), (south, "South")] {
            repo.insert_zone(Zone {
                id,
                name: name.into(),
                coordinator_id: None,
            })
            .await;
        }
        let worker = User {
            id: Uuid::new_v4(),
            name: "North Worker".into(),
            role: UserRole::Worker,
            zone_ids: vec![north],
            is_active: true,
            guest_count: 2,
        };
        for (zone_id, stage) in [
            (north, AssimilationStage::Joined),
            (north, AssimilationStage::Invited),
            (south, AssimilationStage::Invited),
        ] {
            repo.insert_guest(Guest {
                id: Uuid::new_v4(),
                name: "Guest".into(),
                created_by_id: Some(worker.id),
                assigned_to_id: Some(worker.id),
                zone_id: Some(zone_id),
                assimilation_stage: stage,
                last_contact: Some(now() - Duration::days(10)),
                created_at: Some(now() - Duration::days(12)),
                milestones: vec![],
            })
            .await;
        }
        repo.insert_user(worker).await;
        (repo, north, south)
    }

    #[tokio::test]
    async fn test_report_respects_zone_filter() {
        let (repo, north, _) = seeded().await;
        let service = AnalyticsService::new(repo, FollowUpPolicy::default());

        let all = service.report(Period::Weekly, None, now()).await.unwrap();
        let zoned = service.report(Period::Weekly, Some(north), now()).await.unwrap();

        assert_eq!(all.total_guests, 3);
        assert_eq!(all.zone_performance.len(), 2);
        assert_eq!(zoned.total_guests, 2);
        assert_eq!(zoned.conversion_rate, 50);
        assert_eq!(zoned.zone_performance.len(), 1);
        assert_eq!(zoned.active_workers, 1);
    }

    #[tokio::test]
    async fn test_leaderboards_and_limit() {
        let (repo, _, south) = seeded().await;
        let service = AnalyticsService::new(repo, FollowUpPolicy::default());

        let workers = service
            .worker_leaderboard(Period::Monthly, None, None, now())
            .await
            .unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].stats.guests_captured, 3);
        assert_eq!(workers[0].zone, "North");

        let none_in_south = service
            .worker_leaderboard(Period::Monthly, Some(south), None, now())
            .await
            .unwrap();
        assert!(none_in_south.is_empty());

        let zones = service
            .zone_leaderboard(Period::Monthly, Some(1), now())
            .await
            .unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone, "North");
    }

    #[tokio::test]
    async fn test_follow_ups_skip_joined_guests() {
        let (repo, _, _) = seeded().await;
        let service = AnalyticsService::new(repo, FollowUpPolicy::new(7));

        let notices = service.follow_ups(None, now()).await.unwrap();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.stage == AssimilationStage::Invited));
    }

    #[tokio::test]
    async fn test_repeated_reports_are_identical() {
        let (repo, _, _) = seeded().await;
        let service = AnalyticsService::new(repo, FollowUpPolicy::default());

        let first = service.report(Period::Quarterly, None, now()).await.unwrap();
        let second = service.report(Period::Quarterly, None, now()).await.unwrap();
        assert_eq!(first, second);
    }
}
