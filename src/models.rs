//! Domain models for the guest follow-up service.
//!
//! Stored entities (guests, milestones, engagements, users, zones) and the
//! derived report types produced by the analytics engines. Stages, roles and
//! channels are closed enums so the funnel order and badge rules stay
//! exhaustive.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseError;

// ============================================================================
// Enumerations
// ============================================================================

/// Position of a guest in the assimilation funnel.
///
/// Forward-only progression is not enforced; a guest may be moved back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssimilationStage {
    Invited,
    Attended,
    Discipled,
    Joined,
}

impl AssimilationStage {
    /// Funnel order.
    pub const ALL: [AssimilationStage; 4] = [
        AssimilationStage::Invited,
        AssimilationStage::Attended,
        AssimilationStage::Discipled,
        AssimilationStage::Joined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssimilationStage::Invited => "INVITED",
            AssimilationStage::Attended => "ATTENDED",
            AssimilationStage::Discipled => "DISCIPLED",
            AssimilationStage::Joined => "JOINED",
        }
    }

    /// Chart color used by the dashboard for this stage.
    pub fn color(&self) -> &'static str {
        match self {
            AssimilationStage::Invited => "#3B82F6",
            AssimilationStage::Attended => "#10B981",
            AssimilationStage::Discipled => "#F59E0B",
            AssimilationStage::Joined => "#8B5CF6",
        }
    }

    /// Why guests typically stall at this stage. `Joined` is terminal.
    pub fn drop_off_reason(&self) -> Option<&'static str> {
        match self {
            AssimilationStage::Invited => Some("Did not attend a service after the invitation"),
            AssimilationStage::Attended => Some("Attended but did not start discipleship"),
            AssimilationStage::Discipled => {
                Some("Completed discipleship without joining membership")
            }
            AssimilationStage::Joined => None,
        }
    }
}

impl fmt::Display for AssimilationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssimilationStage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INVITED" => Ok(AssimilationStage::Invited),
            "ATTENDED" => Ok(AssimilationStage::Attended),
            "DISCIPLED" => Ok(AssimilationStage::Discipled),
            "JOINED" => Ok(AssimilationStage::Joined),
            _ => Err(ParseError::new("assimilation stage", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl FromStr for MilestoneStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(MilestoneStatus::Pending),
            "IN_PROGRESS" => Ok(MilestoneStatus::InProgress),
            "COMPLETED" => Ok(MilestoneStatus::Completed),
            "CANCELLED" => Ok(MilestoneStatus::Cancelled),
            _ => Err(ParseError::new("milestone status", s)),
        }
    }
}

/// Channel an engagement went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementType {
    Phone,
    Whatsapp,
    Sms,
    Email,
    InPerson,
}

impl EngagementType {
    pub fn is_call(&self) -> bool {
        matches!(self, EngagementType::Phone | EngagementType::Whatsapp)
    }

    pub fn is_visit(&self) -> bool {
        matches!(self, EngagementType::InPerson)
    }
}

impl FromStr for EngagementType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PHONE" => Ok(EngagementType::Phone),
            "WHATSAPP" => Ok(EngagementType::Whatsapp),
            "SMS" => Ok(EngagementType::Sms),
            "EMAIL" => Ok(EngagementType::Email),
            "IN_PERSON" => Ok(EngagementType::InPerson),
            _ => Err(ParseError::new("engagement type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Worker,
    Coordinator,
    Admin,
    Pastor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Worker => "WORKER",
            UserRole::Coordinator => "COORDINATOR",
            UserRole::Admin => "ADMIN",
            UserRole::Pastor => "PASTOR",
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WORKER" => Ok(UserRole::Worker),
            "COORDINATOR" => Ok(UserRole::Coordinator),
            "ADMIN" => Ok(UserRole::Admin),
            "PASTOR" => Ok(UserRole::Pastor),
            _ => Err(ParseError::new("user role", s)),
        }
    }
}

/// Direction of a metric between two adjacent periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn compare<T: PartialOrd>(current: T, previous: T) -> Self {
        if current > previous {
            TrendDirection::Up
        } else if current < previous {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}

// ============================================================================
// Stored Entities
// ============================================================================

/// A newcomer being followed up through the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: Uuid,
    pub name: String,
    /// Worker credited with bringing the guest in.
    pub created_by_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub assimilation_stage: AssimilationStage,
    pub last_contact: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub title: String,
    pub status: MilestoneStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A logged interaction between a worker and a guest. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub worker_id: Uuid,
    #[serde(rename = "type")]
    pub engagement_type: EngagementType,
    pub notes: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Engagement {
    /// When the interaction happened, falling back to the record time.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub zone_ids: Vec<Uuid>,
    pub is_active: bool,
    #[serde(default)]
    pub guest_count: u32,
}

impl User {
    pub fn is_active_worker(&self) -> bool {
        self.is_active && self.role == UserRole::Worker
    }

    /// Up to two uppercase initials, used as the leaderboard avatar.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
    pub coordinator_id: Option<Uuid>,
}

// ============================================================================
// Derived Report Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDistribution {
    pub name: AssimilationStage,
    pub value: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOffEntry {
    pub stage: AssimilationStage,
    pub next_stage: AssimilationStage,
    pub drop_off: u32,
    pub reason: &'static str,
}

/// Per-worker activity over one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub guests_captured: u32,
    pub conversions: u32,
    pub calls_made: u32,
    pub visits_made: u32,
    pub milestone_completions: u32,
    /// Percentage of days in the period with at least one engagement.
    pub consistency: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    #[serde(rename = "Top Evangelist")]
    TopEvangelist,
    #[serde(rename = "Consistent Caller")]
    ConsistentCaller,
    #[serde(rename = "Conversion King")]
    ConversionKing,
    #[serde(rename = "Visit Champion")]
    VisitChampion,
    #[serde(rename = "Phone Warrior")]
    PhoneWarrior,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerLeaderboardEntry {
    pub id: Uuid,
    pub name: String,
    pub zone: String,
    pub avatar: String,
    pub stats: WorkerStats,
    pub badges: Vec<Badge>,
    pub trend: TrendDirection,
    pub points: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStats {
    pub total_guests: u32,
    pub conversions: u32,
    pub conversion_rate: u32,
    pub active_workers: u32,
    /// Hours from guest creation to first engagement, one decimal place.
    pub avg_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneLeaderboardEntry {
    pub id: Uuid,
    pub zone: String,
    pub coordinator: String,
    pub stats: ZoneStats,
    pub points: u64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub month: String,
    pub guests: u32,
    pub conversions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonePerformance {
    pub zone: String,
    pub guests: u32,
    pub conversions: u32,
    pub conversion_rate: u32,
}

/// Dashboard-wide analytics for one period and optional zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_guests: u32,
    pub conversion_rate: u32,
    pub avg_time_to_conversion: u32,
    pub active_workers: u32,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub zone_performance: Vec<ZonePerformance>,
    pub stage_distribution: Vec<StageDistribution>,
    pub drop_off_analysis: Vec<DropOffEntry>,
    pub top_performers: Vec<WorkerLeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticePriority {
    Normal,
    High,
}

/// A guest who is overdue for contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpNotice {
    pub guest_id: Uuid,
    pub guest_name: String,
    pub assigned_to_id: Option<Uuid>,
    pub stage: AssimilationStage,
    pub days_since_contact: i64,
    pub priority: NoticePriority,
}

// ============================================================================
// Response Models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}
