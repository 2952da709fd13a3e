//! Zone scoring: the zone-level counterpart of the worker leaderboard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{count, percent, Snapshot};
use crate::models::{
    AssimilationStage, Engagement, Guest, TrendDirection, User, Zone, ZoneLeaderboardEntry,
    ZoneStats,
};
use crate::period::{Period, Window};

const GUEST_POINTS: u64 = 50;
const CONVERSION_POINTS: u64 = 200;
const RATE_POINTS: u64 = 100;
const WORKER_POINTS: u64 = 500;

const NO_COORDINATOR: &str = "Unassigned";

#[derive(Debug, Clone, Copy)]
pub struct ZoneScoringEngine {
    period: Period,
    now: DateTime<Utc>,
}

impl ZoneScoringEngine {
    pub fn new(period: Period, now: DateTime<Utc>) -> Self {
        Self { period, now }
    }

    /// Guests on the zone's books by the time `window` closes. Undated guests
    /// are left out of every window so both trend periods share one rule.
    fn total_guests(zone_guests: &[&Guest], window: &Window) -> u32 {
        count(
            zone_guests
                .iter()
                .filter(|g| g.created_at.is_some_and(|at| window.closes_after(at))),
        )
    }

    fn conversions(zone_guests: &[&Guest], window: &Window) -> u32 {
        count(
            zone_guests
                .iter()
                .filter(|g| g.assimilation_stage == AssimilationStage::Joined)
                .filter(|g| window.contains_opt(g.last_contact)),
        )
    }

    fn conversion_rate(zone_guests: &[&Guest], window: &Window) -> u32 {
        percent(
            i64::from(Self::conversions(zone_guests, window)),
            i64::from(Self::total_guests(zone_guests, window)),
        )
    }

    /// Mean hours from guest creation to first engagement for guests created
    /// in the window. Engagements dated before the guest existed are ignored.
    /// Guests never engaged are left out; `0.0` if none remain.
    fn avg_response_time(
        zone_guests: &[&Guest],
        engagements: &[Engagement],
        window: &Window,
    ) -> f64 {
        let created: HashMap<Uuid, DateTime<Utc>> = zone_guests
            .iter()
            .filter_map(|g| {
                let at = g.created_at.filter(|at| window.contains(*at))?;
                Some((g.id, at))
            })
            .collect();

        let mut first_contact: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
        for engagement in engagements {
            let Some(created_at) = created.get(&engagement.guest_id) else {
                continue;
            };
            if let Some(at) = engagement.occurred_at().filter(|at| at >= created_at) {
                first_contact
                    .entry(engagement.guest_id)
                    .and_modify(|first| *first = (*first).min(at))
                    .or_insert(at);
            }
        }

        let hours: Vec<f64> = zone_guests
            .iter()
            .filter_map(|g| {
                let created_at = created.get(&g.id)?;
                let first = first_contact.get(&g.id)?;
                Some((*first - *created_at).num_minutes() as f64 / 60.0)
            })
            .collect();

        if hours.is_empty() {
            return 0.0;
        }
        let mean = hours.iter().sum::<f64>() / hours.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    pub fn stats(&self, zone: &Zone, snapshot: &Snapshot<'_>) -> ZoneStats {
        let window = self.period.current_window(self.now);
        let zone_guests = guests_in(zone.id, snapshot.guests);

        let total_guests = Self::total_guests(&zone_guests, &window);
        let conversions = Self::conversions(&zone_guests, &window);

        ZoneStats {
            total_guests,
            conversions,
            conversion_rate: percent(i64::from(conversions), i64::from(total_guests)),
            active_workers: count(
                snapshot
                    .users
                    .iter()
                    .filter(|u| u.is_active_worker() && u.zone_ids.contains(&zone.id)),
            ),
            avg_response_time: Self::avg_response_time(&zone_guests, snapshot.engagements, &window),
        }
    }

    pub fn points(stats: &ZoneStats) -> u64 {
        u64::from(stats.total_guests) * GUEST_POINTS
            + u64::from(stats.conversions) * CONVERSION_POINTS
            + u64::from(stats.conversion_rate) * RATE_POINTS
            + u64::from(stats.active_workers) * WORKER_POINTS
    }

    /// Conversion rate in the current period against the one before it.
    pub fn trend(&self, zone_id: Uuid, guests: &[Guest]) -> TrendDirection {
        let zone_guests = guests_in(zone_id, guests);
        TrendDirection::compare(
            Self::conversion_rate(&zone_guests, &self.period.current_window(self.now)),
            Self::conversion_rate(&zone_guests, &self.period.previous_window(self.now)),
        )
    }

    pub fn score(&self, zone: &Zone, snapshot: &Snapshot<'_>) -> ZoneLeaderboardEntry {
        let stats = self.stats(zone, snapshot);
        ZoneLeaderboardEntry {
            id: zone.id,
            zone: zone.name.clone(),
            coordinator: coordinator_name(zone, snapshot.users),
            points: Self::points(&stats),
            trend: self.trend(zone.id, snapshot.guests),
            stats,
        }
    }

    /// Every zone in the snapshot, highest points first, ties in input order.
    pub fn leaderboard(&self, snapshot: &Snapshot<'_>) -> Vec<ZoneLeaderboardEntry> {
        let mut entries: Vec<ZoneLeaderboardEntry> = snapshot
            .zones
            .iter()
            .map(|zone| self.score(zone, snapshot))
            .collect();
        entries.sort_by(|a, b| b.points.cmp(&a.points));

        debug!(period = ?self.period, zones = entries.len(), "Zone leaderboard computed");
        entries
    }
}

fn guests_in(zone_id: Uuid, guests: &[Guest]) -> Vec<&Guest> {
    guests.iter().filter(|g| g.zone_id == Some(zone_id)).collect()
}

fn coordinator_name(zone: &Zone, users: &[User]) -> String {
    zone.coordinator_id
        .and_then(|id| users.iter().find(|u| u.id == id))
        .map(|u| u.name.clone())
        .unwrap_or_else(|| NO_COORDINATOR.to_string())
}
