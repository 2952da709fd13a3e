//! Overdue follow-up detection for the notifications feed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AssimilationStage, FollowUpNotice, Guest, NoticePriority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpPolicy {
    /// Days without contact before a guest is flagged.
    pub after_days: i64,
}

impl Default for FollowUpPolicy {
    fn default() -> Self {
        Self { after_days: 7 }
    }
}

impl FollowUpPolicy {
    pub fn new(after_days: i64) -> Self {
        Self { after_days }
    }

    /// Guests not yet joined whose last contact (or creation, if never
    /// contacted) is at least `after_days` old. Longest-waiting first.
    pub fn overdue(
        &self,
        guests: &[Guest],
        worker_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Vec<FollowUpNotice> {
        let mut notices: Vec<FollowUpNotice> = guests
            .iter()
            .filter(|g| g.assimilation_stage != AssimilationStage::Joined)
            .filter(|g| worker_id.map_or(true, |id| g.assigned_to_id == Some(id)))
            .filter_map(|g| {
                let reference = g.last_contact.or(g.created_at)?;
                let days = (now - reference).num_days();
                (days >= self.after_days).then(|| FollowUpNotice {
                    guest_id: g.id,
                    guest_name: g.name.clone(),
                    assigned_to_id: g.assigned_to_id,
                    stage: g.assimilation_stage,
                    days_since_contact: days,
                    priority: self.priority(days),
                })
            })
            .collect();
        notices.sort_by(|a, b| b.days_since_contact.cmp(&a.days_since_contact));
        notices
    }

    fn priority(&self, days: i64) -> NoticePriority {
        if days >= self.after_days.saturating_mul(2) {
            NoticePriority::High
        } else {
            NoticePriority::Normal
        }
    }
}
