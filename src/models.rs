use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiType {
    Tangible,
    Intangible,
}

impl RoiType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tangible" => Some(Self::Tangible),
            "intangible" => Some(Self::Intangible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiCategory {
    Revenue,
    Cost,
    Time,
    Process,
    Clarity,
    Confidence,
    Tranquility,
    StatusDirection,
}

impl RoiCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "revenue" => Some(Self::Revenue),
            "cost" => Some(Self::Cost),
            "time" => Some(Self::Time),
            "process" => Some(Self::Process),
            "clarity" => Some(Self::Clarity),
            "confidence" => Some(Self::Confidence),
            "tranquility" => Some(Self::Tranquility),
            "status_direction" => Some(Self::StatusDirection),
            _ => None,
        }
    }

    pub fn roi_type(self) -> RoiType {
        match self {
            Self::Revenue | Self::Cost | Self::Time | Self::Process => RoiType::Tangible,
            Self::Clarity | Self::Confidence | Self::Tranquility | Self::StatusDirection => {
                RoiType::Intangible
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Unknown labels are treated as low impact.
    pub fn parse(value: &str) -> Self {
        match value {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ClientToTeam,
    TeamToClient,
}

impl Direction {
    pub fn parse(value: &str) -> Self {
        match value {
            "client_to_team" => Self::ClientToTeam,
            _ => Self::TeamToClient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "highE_highROI")]
    HighEHighRoi,
    #[serde(rename = "highE_lowROI")]
    HighELowRoi,
    #[serde(rename = "lowE_highROI")]
    LowEHighRoi,
    #[serde(rename = "lowE_lowROI")]
    LowELowRoi,
}

impl Quadrant {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "highE_highROI" => Some(Self::HighEHighRoi),
            "highE_lowROI" => Some(Self::HighELowRoi),
            "lowE_highROI" => Some(Self::LowEHighRoi),
            "lowE_lowROI" => Some(Self::LowELowRoi),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighEHighRoi => "highE_highROI",
            Self::HighELowRoi => "highE_lowROI",
            Self::LowEHighRoi => "lowE_highROI",
            Self::LowELowRoi => "lowE_lowROI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Flat,
    Down,
}

impl Trend {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "flat" => Some(Self::Flat),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Flat => "flat",
            Self::Down => "down",
        }
    }
}

/// Statuses this engine may assign. Other statuses on a client are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    ChurnRisk,
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ChurnRisk => "churn_risk",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValueEvent {
    pub roi_type: RoiType,
    pub category: Option<RoiCategory>,
    pub impact: Impact,
    pub source: String,
    pub happened_at: DateTime<Utc>,
}

impl ValueEvent {
    /// Category decides the partition; the stored roi_type covers unknown categories.
    pub fn partition(&self) -> RoiType {
        self.category
            .map(RoiCategory::roi_type)
            .unwrap_or(self.roi_type)
    }
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub source: String,
    pub direction: Direction,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub session_id: Uuid,
    pub duration_sec: i64,
    pub join_delay_sec: i64,
    pub join_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LiveInteractionRecord {
    pub kind: String,
    pub count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRef {
    pub id: Uuid,
    pub account_id: Uuid,
}

/// Everything read for one client over the scoring window.
#[derive(Debug, Clone, Default)]
pub struct ClientSignals {
    pub value_events: Vec<ValueEvent>,
    pub messages: Vec<MessageEvent>,
    pub attendance: Vec<AttendanceRecord>,
    pub sessions_offered: i64,
    pub interactions: Vec<LiveInteractionRecord>,
}

impl ClientSignals {
    /// Most recent timestamp across every signal family.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let value = self.value_events.iter().map(|event| event.happened_at);
        let messages = self.messages.iter().map(|message| message.sent_at);
        let attendance = self.attendance.iter().map(|record| record.join_time);
        let interactions = self.interactions.iter().map(|record| record.created_at);
        value.chain(messages).chain(attendance).chain(interactions).max()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSnapshot {
    pub account_id: Uuid,
    pub client_id: Uuid,
    pub escore: i32,
    pub roizometer: i32,
    pub quadrant: Quadrant,
    pub trend: Trend,
    pub computed_at: DateTime<Utc>,
}

impl ScoreSnapshot {
    pub fn combined(&self) -> i32 {
        self.escore + self.roizometer
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    pub account_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountResult {
    pub account_id: Uuid,
    pub clients_processed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub success: bool,
    pub message: String,
    pub results: Vec<AccountResult>,
}
