//! Reporting periods and the time windows derived from them.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    /// Parse a query token. Unknown or missing tokens fall back to weekly.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("daily") => Period::Daily,
            Some("weekly") => Period::Weekly,
            Some("monthly") => Period::Monthly,
            Some("quarterly") => Period::Quarterly,
            Some("yearly") => Period::Yearly,
            _ => Period::Weekly,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::Daily => 1,
            Period::Weekly => 7,
            Period::Monthly => 30,
            Period::Quarterly => 90,
            Period::Yearly => 365,
        }
    }

    /// `[now - days, ∞)`: everything since the period started.
    pub fn current_window(&self, now: DateTime<Utc>) -> Window {
        Window {
            start: now - Duration::days(self.days()),
            end: None,
            days: self.days(),
        }
    }

    /// The window of equal length immediately before the current one.
    pub fn previous_window(&self, now: DateTime<Utc>) -> Window {
        let current = self.current_window(now);
        Window {
            start: current.start - Duration::days(self.days()),
            end: Some(current.start),
            days: self.days(),
        }
    }
}

/// Half-open time range. An open end means "up to now and beyond".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub days: i64,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }

    /// Missing timestamps are never inside a window.
    pub fn contains_opt(&self, at: Option<DateTime<Utc>>) -> bool {
        at.is_some_and(|t| self.contains(t))
    }

    /// Whether `at` falls before the window closes (all of time for open windows).
    pub fn closes_after(&self, at: DateTime<Utc>) -> bool {
        self.end.map_or(true, |end| at < end)
    }
}
