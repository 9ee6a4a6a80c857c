use std::collections::HashSet;

use crate::config::{AccountSettings, PUNCTUAL_JOIN_DELAY_SEC};
use crate::models::{
    AttendanceRecord, ClientSignals, Direction, LiveInteractionRecord, MessageEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementBreakdown {
    pub messages: i32,
    pub presence: i32,
    pub participation: i32,
}

impl EngagementBreakdown {
    pub fn escore(&self) -> i32 {
        (self.messages + self.presence + self.participation).clamp(0, 100)
    }
}

/// Not clamped to `budget`; a heavy audio bonus can push it past the budget.
pub fn message_engagement(messages: &[MessageEvent], budget: i32) -> i32 {
    if messages.is_empty() {
        return 0;
    }

    let total = messages.len() as f64;
    let from_client = messages
        .iter()
        .filter(|message| message.direction == Direction::ClientToTeam)
        .count() as f64;
    let audio = messages
        .iter()
        .filter(|message| message.source.to_ascii_lowercase().contains("audio"))
        .count() as f64;

    let frequency_score = (total / 30.0).min(1.0);
    let response_score = (from_client / 15.0).min(1.0);
    let audio_bonus = (audio * 0.1).min(0.3);

    ((frequency_score * 0.5 + response_score * 0.5 + audio_bonus) * budget as f64).round() as i32
}

/// `sessions_offered` is account-wide, not limited to sessions the client was invited to.
/// Rows are grouped by session, so rejoins of one session count once.
pub fn live_presence(attendance: &[AttendanceRecord], sessions_offered: i64, budget: i32) -> i32 {
    if sessions_offered <= 0 {
        return 0;
    }

    let attended_sessions = attendance
        .iter()
        .map(|record| record.session_id)
        .collect::<HashSet<_>>()
        .len() as f64;
    let attendance_rate = (attended_sessions / sessions_offered as f64).min(1.0);

    let avg_duration_sec = if attendance.is_empty() {
        0.0
    } else {
        attendance
            .iter()
            .map(|record| record.duration_sec as f64)
            .sum::<f64>()
            / attended_sessions
    };
    let duration_score = (avg_duration_sec / 3600.0).min(1.0);

    let punctual = attendance
        .iter()
        .filter(|record| record.join_delay_sec < PUNCTUAL_JOIN_DELAY_SEC)
        .map(|record| record.session_id)
        .collect::<HashSet<_>>()
        .len() as f64;
    let punctuality_score = punctual / attended_sessions.max(1.0);

    ((attendance_rate * 0.5 + duration_score * 0.3 + punctuality_score * 0.2) * budget as f64)
        .round() as i32
}

pub fn live_participation(interactions: &[LiveInteractionRecord], budget: i32) -> i32 {
    if interactions.is_empty() {
        return 0;
    }

    let total_interactions: i64 = interactions
        .iter()
        .map(|record| record.count.unwrap_or(1))
        .sum();
    let distinct_types = interactions
        .iter()
        .map(|record| record.kind.as_str())
        .collect::<HashSet<_>>()
        .len() as f64;
    let type_bonus = distinct_types * 0.1;

    let raw = ((total_interactions as f64 / 20.0).min(1.0) + type_bonus) * budget as f64;
    (raw.round() as i32).min(budget)
}

pub fn score_engagement(
    signals: &ClientSignals,
    settings: &AccountSettings,
) -> EngagementBreakdown {
    EngagementBreakdown {
        messages: message_engagement(&signals.messages, settings.escore_whatsapp_engagement),
        presence: live_presence(
            &signals.attendance,
            signals.sessions_offered,
            settings.escore_live_presence,
        ),
        participation: live_participation(
            &signals.interactions,
            settings.escore_live_participation,
        ),
    }
}
