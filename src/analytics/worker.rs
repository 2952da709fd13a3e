//! Worker scoring: activity stats, badges, points and trend for the worker
//! leaderboard.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{count, percent, Snapshot};
use crate::models::{
    AssimilationStage, Badge, Engagement, Guest, MilestoneStatus, TrendDirection, User,
    WorkerLeaderboardEntry, WorkerStats, Zone,
};
use crate::period::{Period, Window};

impl Badge {
    pub const ALL: [Badge; 5] = [
        Badge::TopEvangelist,
        Badge::ConsistentCaller,
        Badge::ConversionKing,
        Badge::VisitChampion,
        Badge::PhoneWarrior,
    ];

    /// Thresholds are inclusive.
    pub fn is_earned(&self, stats: &WorkerStats) -> bool {
        match self {
            Badge::TopEvangelist => stats.guests_captured >= 25,
            Badge::ConsistentCaller => stats.consistency >= 90,
            Badge::ConversionKing => stats.conversions >= 8,
            Badge::VisitChampion => stats.visits_made >= 20,
            Badge::PhoneWarrior => stats.calls_made >= 150,
        }
    }
}

const GUEST_POINTS: u64 = 50;
const CONVERSION_POINTS: u64 = 200;
const CALL_POINTS: u64 = 5;
const VISIT_POINTS: u64 = 20;
const MILESTONE_POINTS: u64 = 30;
const CONSISTENCY_POINTS: u64 = 10;
const BADGE_POINTS: u64 = 100;

const UNASSIGNED_ZONE: &str = "Unassigned";

/// Scores workers for one period ending at a fixed `now`.
#[derive(Debug, Clone, Copy)]
pub struct WorkerScoringEngine {
    period: Period,
    now: DateTime<Utc>,
}

impl WorkerScoringEngine {
    pub fn new(period: Period, now: DateTime<Utc>) -> Self {
        Self { period, now }
    }

    pub fn stats(
        worker_id: Uuid,
        window: &Window,
        guests: &[Guest],
        engagements: &[Engagement],
    ) -> WorkerStats {
        let assigned = || guests.iter().filter(move |g| g.assigned_to_id == Some(worker_id));
        let logged: Vec<(&Engagement, DateTime<Utc>)> = engagements
            .iter()
            .filter(|e| e.worker_id == worker_id)
            .filter_map(|e| Some((e, e.occurred_at()?)))
            .filter(|(_, at)| window.contains(*at))
            .collect();

        let guests_captured = count(
            guests
                .iter()
                .filter(|g| g.created_by_id == Some(worker_id))
                .filter(|g| window.contains_opt(g.created_at)),
        );
        let conversions = count(
            assigned()
                .filter(|g| g.assimilation_stage == AssimilationStage::Joined)
                .filter(|g| window.contains_opt(g.last_contact)),
        );
        let calls_made = count(logged.iter().filter(|(e, _)| e.engagement_type.is_call()));
        let visits_made = count(logged.iter().filter(|(e, _)| e.engagement_type.is_visit()));
        let milestone_completions = count(
            assigned()
                .flat_map(|g| g.milestones.iter())
                .filter(|m| m.status == MilestoneStatus::Completed)
                .filter(|m| window.contains_opt(m.completed_at)),
        );

        let active_days: HashSet<_> = logged.iter().map(|(_, at)| at.date_naive()).collect();
        let consistency = percent(active_days.len() as i64, window.days);

        WorkerStats {
            guests_captured,
            conversions,
            calls_made,
            visits_made,
            milestone_completions,
            consistency,
        }
    }

    pub fn badges(stats: &WorkerStats) -> Vec<Badge> {
        Badge::ALL
            .into_iter()
            .filter(|badge| badge.is_earned(stats))
            .collect()
    }

    pub fn points(stats: &WorkerStats, badges: &[Badge]) -> u64 {
        u64::from(stats.guests_captured) * GUEST_POINTS
            + u64::from(stats.conversions) * CONVERSION_POINTS
            + u64::from(stats.calls_made) * CALL_POINTS
            + u64::from(stats.visits_made) * VISIT_POINTS
            + u64::from(stats.milestone_completions) * MILESTONE_POINTS
            + u64::from(stats.consistency) * CONSISTENCY_POINTS
            + badges.len() as u64 * BADGE_POINTS
    }

    /// Conversions in the current period against the one before it.
    pub fn trend(&self, worker_id: Uuid, guests: &[Guest]) -> TrendDirection {
        let conversions = |window: Window| {
            count(
                guests
                    .iter()
                    .filter(|g| g.assigned_to_id == Some(worker_id))
                    .filter(|g| g.assimilation_stage == AssimilationStage::Joined)
                    .filter(|g| window.contains_opt(g.last_contact)),
            )
        };
        TrendDirection::compare(
            conversions(self.period.current_window(self.now)),
            conversions(self.period.previous_window(self.now)),
        )
    }

    pub fn score(&self, worker: &User, snapshot: &Snapshot<'_>) -> WorkerLeaderboardEntry {
        let window = self.period.current_window(self.now);
        let stats = Self::stats(worker.id, &window, snapshot.guests, snapshot.engagements);
        let badges = Self::badges(&stats);
        let points = Self::points(&stats, &badges);

        WorkerLeaderboardEntry {
            id: worker.id,
            name: worker.name.clone(),
            zone: zone_name(worker, snapshot.zones),
            avatar: worker.initials(),
            trend: self.trend(worker.id, snapshot.guests),
            stats,
            badges,
            points,
        }
    }

    /// Active workers in the snapshot, highest points first. Ties keep the
    /// order the workers were supplied in.
    pub fn leaderboard(&self, snapshot: &Snapshot<'_>) -> Vec<WorkerLeaderboardEntry> {
        let mut entries: Vec<WorkerLeaderboardEntry> = snapshot
            .users
            .iter()
            .filter(|u| u.is_active_worker())
            .map(|worker| self.score(worker, snapshot))
            .collect();
        entries.sort_by(|a, b| b.points.cmp(&a.points));

        debug!(
            period = ?self.period,
            workers = entries.len(),
            "Worker leaderboard computed"
        );
        entries
    }
}

fn zone_name(worker: &User, zones: &[Zone]) -> String {
    worker
        .zone_ids
        .first()
        .and_then(|id| zones.iter().find(|z| z.id == *id))
        .map(|z| z.name.clone())
        .unwrap_or_else(|| UNASSIGNED_ZONE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementType, Milestone, UserRole};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()
    }

    fn worker(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role: UserRole::Worker,
            zone_ids: vec![],
            is_active: true,
            guest_count: 0,
        }
    }

    fn guest_for(worker_id: Uuid, stage: AssimilationStage, days_ago: i64) -> Guest {
        let at = now() - Duration::days(days_ago);
        Guest {
            id: Uuid::new_v4(),
            name: "Guest".into(),
            created_by_id: Some(worker_id),
            assigned_to_id: Some(worker_id),
            zone_id: None,
            assimilation_stage: stage,
            last_contact: Some(at),
            created_at: Some(at),
            milestones: vec![],
        }
    }

    fn engagement(worker_id: Uuid, kind: EngagementType, hours_ago: i64) -> Engagement {
        Engagement {
            id: Uuid::new_v4(),
            guest_id: Uuid::new_v4(),
            worker_id,
            engagement_type: kind,
            notes: None,
            timestamp: Some(now() - Duration::hours(hours_ago)),
            created_at: None,
        }
    }

    fn scenario_b_stats() -> WorkerStats {
        WorkerStats {
            guests_captured: 25,
            conversions: 8,
            calls_made: 150,
            visits_made: 20,
            milestone_completions: 0,
            consistency: 90,
        }
    }

    #[test]
    fn test_scenario_b_all_badges_and_points() {
        let stats = scenario_b_stats();
        let badges = WorkerScoringEngine::badges(&stats);

        assert_eq!(badges, Badge::ALL.to_vec());
        assert_eq!(WorkerScoringEngine::points(&stats, &badges), 5400);
    }

    #[test]
    fn test_badge_thresholds_are_inclusive() {
        let stats = WorkerStats {
            guests_captured: 25,
            ..WorkerStats::default()
        };
        assert_eq!(WorkerScoringEngine::badges(&stats), vec![Badge::TopEvangelist]);

        let stats = WorkerStats {
            guests_captured: 24,
            consistency: 89,
            conversions: 7,
            visits_made: 19,
            calls_made: 149,
            milestone_completions: 0,
        };
        assert!(WorkerScoringEngine::badges(&stats).is_empty());
    }

    #[test]
    fn test_stats_count_period_activity() {
        let w = worker("Ada Obi");
        let window = Period::Weekly.current_window(now());
        let mut converted = guest_for(w.id, AssimilationStage::Joined, 2);
        converted.milestones = vec![
            Milestone {
                id: Uuid::new_v4(),
                guest_id: converted.id,
                title: "Baptism class".into(),
                status: MilestoneStatus::Completed,
                completed_at: Some(now() - Duration::days(1)),
            },
            Milestone {
                id: Uuid::new_v4(),
                guest_id: converted.id,
                title: "Membership class".into(),
                status: MilestoneStatus::Completed,
                completed_at: Some(now() - Duration::days(20)),
            },
        ];
        let guests = vec![
            converted,
            guest_for(w.id, AssimilationStage::Invited, 1),
            guest_for(w.id, AssimilationStage::Joined, 10),
            guest_for(Uuid::new_v4(), AssimilationStage::Joined, 1),
        ];
        let engagements = vec![
            engagement(w.id, EngagementType::Phone, 1),
            engagement(w.id, EngagementType::Whatsapp, 2),
            engagement(w.id, EngagementType::InPerson, 30),
            engagement(w.id, EngagementType::Email, 50),
            engagement(w.id, EngagementType::Phone, 24 * 9),
            engagement(Uuid::new_v4(), EngagementType::Phone, 1),
        ];

        let stats = WorkerScoringEngine::stats(w.id, &window, &guests, &engagements);

        assert_eq!(stats.guests_captured, 2);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.calls_made, 2);
        assert_eq!(stats.visits_made, 1);
        assert_eq!(stats.milestone_completions, 1);
        // 1h and 2h ago land on 1 June, 30h on 31 May, 50h on 30 May.
        assert_eq!(stats.consistency, percent(3, 7));
    }

    #[test]
    fn test_records_without_timestamps_are_excluded() {
        let w = worker("Ben");
        let window = Period::Weekly.current_window(now());
        let mut undated = guest_for(w.id, AssimilationStage::Joined, 1);
        undated.created_at = None;
        undated.last_contact = None;
        let mut untimed = engagement(w.id, EngagementType::Phone, 1);
        untimed.timestamp = None;

        let stats = WorkerScoringEngine::stats(w.id, &window, &[undated], &[untimed]);
        assert_eq!(stats, WorkerStats::default());
    }

    #[test]
    fn test_engagement_falls_back_to_created_at() {
        let w = worker("Ben");
        let window = Period::Weekly.current_window(now());
        let mut e = engagement(w.id, EngagementType::InPerson, 1);
        e.created_at = e.timestamp.take();

        let stats = WorkerScoringEngine::stats(w.id, &window, &[], &[e]);
        assert_eq!(stats.visits_made, 1);
    }

    #[test]
    fn test_scenario_d_trend() {
        let w = worker("Cleo");
        let engine = WorkerScoringEngine::new(Period::Weekly, now());
        let mut guests: Vec<Guest> = (0..5)
            .map(|_| guest_for(w.id, AssimilationStage::Joined, 2))
            .collect();
        guests.extend((0..3).map(|_| guest_for(w.id, AssimilationStage::Joined, 10)));
        assert_eq!(engine.trend(w.id, &guests), TrendDirection::Up);

        let mut even: Vec<Guest> = (0..3)
            .map(|_| guest_for(w.id, AssimilationStage::Joined, 2))
            .collect();
        even.extend((0..3).map(|_| guest_for(w.id, AssimilationStage::Joined, 10)));
        assert_eq!(engine.trend(w.id, &even), TrendDirection::Stable);

        let fewer = vec![guest_for(w.id, AssimilationStage::Joined, 10)];
        assert_eq!(engine.trend(w.id, &fewer), TrendDirection::Down);
    }

    #[test]
    fn test_leaderboard_sorted_and_stable() {
        let first = worker("First Tie");
        let second = worker("Second Tie");
        let leader = worker("Leader");
        let mut retired = worker("Retired");
        retired.is_active = false;
        let guests = vec![guest_for(leader.id, AssimilationStage::Joined, 1)];
        let users = vec![first.clone(), second.clone(), leader.clone(), retired];
        let snapshot = Snapshot {
            guests: &guests,
            engagements: &[],
            users: &users,
            zones: &[],
        };

        let board = WorkerScoringEngine::new(Period::Weekly, now()).leaderboard(&snapshot);

        let ids: Vec<Uuid> = board.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![leader.id, first.id, second.id]);
        assert!(board.windows(2).all(|pair| pair[0].points >= pair[1].points));
        assert_eq!(board[0].zone, "Unassigned");
        assert_eq!(board[0].avatar, "L");
    }

    #[test]
    fn test_score_is_deterministic() {
        let w = worker("Dee");
        let guests = vec![guest_for(w.id, AssimilationStage::Joined, 1)];
        let engagements = vec![engagement(w.id, EngagementType::Phone, 3)];
        let users = vec![w.clone()];
        let snapshot = Snapshot {
            guests: &guests,
            engagements: &engagements,
            users: &users,
            zones: &[],
        };
        let engine = WorkerScoringEngine::new(Period::Monthly, now());

        assert_eq!(engine.score(&w, &snapshot), engine.score(&w, &snapshot));
    }
}
