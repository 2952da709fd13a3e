//! Dashboard-wide analytics report.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::debug;

use super::{count, percent, Snapshot, StageFunnelAnalyzer, WorkerScoringEngine};
use crate::models::{AnalyticsReport, AssimilationStage, MonthlyTrend, ZonePerformance};
use crate::period::Period;

const TREND_MONTHS: u32 = 6;
const TOP_PERFORMERS: usize = 5;

pub struct ReportBuilder {
    period: Period,
    now: DateTime<Utc>,
}

impl ReportBuilder {
    pub fn new(period: Period, now: DateTime<Utc>) -> Self {
        Self { period, now }
    }

    /// Build the report for whatever the snapshot holds. Zone filtering is
    /// applied by the caller before the snapshot is assembled.
    pub fn build(&self, snapshot: &Snapshot<'_>) -> AnalyticsReport {
        let funnel = StageFunnelAnalyzer::analyze(snapshot.guests);

        let mut top_performers =
            WorkerScoringEngine::new(self.period, self.now).leaderboard(snapshot);
        top_performers.truncate(TOP_PERFORMERS);

        let report = AnalyticsReport {
            total_guests: funnel.total_guests,
            conversion_rate: funnel.conversion_rate,
            avg_time_to_conversion: funnel.avg_time_to_conversion,
            active_workers: count(snapshot.users.iter().filter(|u| u.is_active_worker())),
            monthly_trends: self.monthly_trends(snapshot),
            zone_performance: Self::zone_performance(snapshot),
            stage_distribution: funnel.stage_distribution,
            drop_off_analysis: funnel.drop_off_analysis,
            top_performers,
        };

        debug!(
            period = ?self.period,
            total_guests = report.total_guests,
            conversion_rate = report.conversion_rate,
            "Analytics report built"
        );
        report
    }

    /// The last six calendar months, oldest first, ending with the month of `now`.
    pub fn monthly_trends(&self, snapshot: &Snapshot<'_>) -> Vec<MonthlyTrend> {
        let (year, month) = (self.now.year(), self.now.month());

        (0..TREND_MONTHS)
            .rev()
            .filter_map(|back| {
                let start = month_start(year, month, back)?;
                let end = month_start(year, month + 1, back)?;
                let within = |at: Option<DateTime<Utc>>| at.is_some_and(|t| t >= start && t < end);

                Some(MonthlyTrend {
                    month: start.format("%b").to_string(),
                    guests: count(snapshot.guests.iter().filter(|g| within(g.created_at))),
                    conversions: count(
                        snapshot
                            .guests
                            .iter()
                            .filter(|g| g.assimilation_stage == AssimilationStage::Joined)
                            .filter(|g| within(g.last_contact)),
                    ),
                })
            })
            .collect()
    }

    pub fn zone_performance(snapshot: &Snapshot<'_>) -> Vec<ZonePerformance> {
        snapshot
            .zones
            .iter()
            .map(|zone| {
                let in_zone = || snapshot.guests.iter().filter(|g| g.zone_id == Some(zone.id));
                let guests = count(in_zone());
                let conversions = count(
                    in_zone().filter(|g| g.assimilation_stage == AssimilationStage::Joined),
                );
                ZonePerformance {
                    zone: zone.name.clone(),
                    guests,
                    conversions,
                    conversion_rate: percent(i64::from(conversions), i64::from(guests)),
                }
            })
            .collect()
    }
}

/// First instant of the month `back` months before (`year`, `month`).
/// `month` may be 13 to mean January of the following year.
fn month_start(year: i32, month: u32, back: u32) -> Option<DateTime<Utc>> {
    let index = i64::from(year) * 12 + i64::from(month) - 1 - i64::from(back);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Guest, User, UserRole, Zone};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 12, 0, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn guest(zone_id: Option<Uuid>, stage: AssimilationStage, at: DateTime<Utc>) -> Guest {
        Guest {
            id: Uuid::new_v4(),
            name: "Guest".into(),
            created_by_id: None,
            assigned_to_id: None,
            zone_id,
            assimilation_stage: stage,
            last_contact: Some(at),
            created_at: Some(at),
            milestones: vec![],
        }
    }

    #[test]
    fn test_month_start_wraps_years() {
        let start = month_start(2025, 2, 3).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap());
        let next = month_start(2024, 13, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_trends_cover_six_months() {
        let guests = vec![
            guest(None, AssimilationStage::Joined, now() - Duration::days(2)),
            guest(None, AssimilationStage::Invited, date(2024, 12, 24)),
            guest(None, AssimilationStage::Invited, date(2024, 1, 1)),
        ];
        let snapshot = Snapshot {
            guests: &guests,
            engagements: &[],
            users: &[],
            zones: &[],
        };

        let trends = ReportBuilder::new(Period::Monthly, now()).monthly_trends(&snapshot);

        let months: Vec<&str> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(trends[3].guests, 1);
        assert_eq!(trends[5].guests, 1);
        assert_eq!(trends[5].conversions, 1);
        assert_eq!(trends.iter().map(|t| t.guests).sum::<u32>(), 2);
    }

    #[test]
    fn test_build_combines_funnel_and_leaderboards() {
        let zone = Zone {
            id: Uuid::new_v4(),
            name: "Harbor".into(),
            coordinator_id: None,
        };
        let workers: Vec<User> = (0..7)
            .map(|i| User {
                id: Uuid::new_v4(),
                name: format!("Worker {i}"),
                role: UserRole::Worker,
                zone_ids: vec![zone.id],
                is_active: true,
                guest_count: 0,
            })
            .collect();
        let guests = vec![
            guest(Some(zone.id), AssimilationStage::Joined, now()),
            guest(Some(zone.id), AssimilationStage::Invited, now()),
        ];
        let zones = vec![zone];
        let snapshot = Snapshot {
            guests: &guests,
            engagements: &[],
            users: &workers,
            zones: &zones,
        };

        let report = ReportBuilder::new(Period::Weekly, now()).build(&snapshot);

        assert_eq!(report.total_guests, 2);
        assert_eq!(report.conversion_rate, 50);
        assert_eq!(report.active_workers, 7);
        assert_eq!(report.top_performers.len(), 5);
        assert_eq!(report.zone_performance.len(), 1);
        assert_eq!(report.zone_performance[0].conversion_rate, 50);
        assert_eq!(report.stage_distribution.len(), 4);
        assert_eq!(report.drop_off_analysis.len(), 3);
    }

    #[test]
    fn test_build_on_empty_snapshot() {
        let snapshot = Snapshot {
            guests: &[],
            engagements: &[],
            users: &[],
            zones: &[],
        };
        let report = ReportBuilder::new(Period::Weekly, now()).build(&snapshot);

        assert_eq!(report.total_guests, 0);
        assert_eq!(report.conversion_rate, 0);
        assert!(report.top_performers.is_empty());
        assert!(report.monthly_trends.iter().all(|t| t.guests == 0));
    }
}
