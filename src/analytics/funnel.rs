//! Stage funnel analysis: distribution, conversion, drop-off and
//! time-to-conversion over a set of guests.

use chrono::Duration;
use serde::Serialize;

use super::{count, percent};
use crate::models::{AssimilationStage, DropOffEntry, Guest, StageDistribution};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub total_guests: u32,
    pub stage_distribution: Vec<StageDistribution>,
    pub conversion_rate: u32,
    pub drop_off_analysis: Vec<DropOffEntry>,
    /// Days, averaged over guests currently in `Joined`.
    pub avg_time_to_conversion: u32,
}

pub struct StageFunnelAnalyzer;

impl StageFunnelAnalyzer {
    pub fn analyze(guests: &[Guest]) -> FunnelReport {
        let counts = AssimilationStage::ALL
            .map(|stage| count(guests.iter().filter(|g| g.assimilation_stage == stage)));
        let total = count(guests.iter());

        let stage_distribution = AssimilationStage::ALL
            .iter()
            .zip(counts)
            .map(|(stage, value)| StageDistribution {
                name: *stage,
                value,
                color: stage.color(),
            })
            .collect();

        let joined = counts[counts.len() - 1];
        let conversion_rate = percent(i64::from(joined), i64::from(total));

        let drop_off_analysis = AssimilationStage::ALL
            .windows(2)
            .zip(counts.windows(2))
            .filter_map(|(stages, pair)| {
                let reason = stages[0].drop_off_reason()?;
                let lost = i64::from(pair[0]) - i64::from(pair[1]);
                Some(DropOffEntry {
                    stage: stages[0],
                    next_stage: stages[1],
                    drop_off: percent(lost, i64::from(pair[0])),
                    reason,
                })
            })
            .collect();

        FunnelReport {
            total_guests: total,
            stage_distribution,
            conversion_rate,
            drop_off_analysis,
            avg_time_to_conversion: Self::avg_time_to_conversion(guests),
        }
    }

    /// Mean of `ceil((lastContact - createdAt) / 1 day)` over joined guests.
    ///
    /// Guests missing either timestamp, or whose last contact predates their
    /// creation, are left out.
    pub fn avg_time_to_conversion(guests: &[Guest]) -> u32 {
        let day_ms = Duration::days(1).num_milliseconds() as f64;
        let days: Vec<f64> = guests
            .iter()
            .filter(|g| g.assimilation_stage == AssimilationStage::Joined)
            .filter_map(|g| Some(g.last_contact? - g.created_at?))
            .filter(|elapsed| *elapsed >= Duration::zero())
            .map(|elapsed| (elapsed.num_milliseconds() as f64 / day_ms).ceil())
            .collect();

        if days.is_empty() {
            return 0;
        }
        (days.iter().sum::<f64>() / days.len() as f64).round() as u32
    }
}
