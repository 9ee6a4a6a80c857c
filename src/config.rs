use serde::{Deserialize, Serialize};

/// Days of history each run looks back over.
pub const WINDOW_DAYS: i64 = 30;

/// Multiplier applied to each ROI half's raw score before capping.
pub const ROI_SCALE: f64 = 5.0;

/// Ceiling for each ROI half, so tangible and intangible weigh the same.
pub const ROI_HALF_CAP: f64 = 50.0;

/// Inclusive cutoff on both axes for quadrant placement and for promotion to `active`.
pub const QUADRANT_CUTOFF: i32 = 50;

/// Combined-score movement that must be exceeded before a trend leaves `flat`.
pub const TREND_BAND: i32 = 10;

/// Joins later than this count as not punctual.
pub const PUNCTUAL_JOIN_DELAY_SEC: i64 = 300;

/// Per-account tuning. Missing rows or NULL columns fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub weight_whatsapp_text: f64,
    pub weight_whatsapp_audio: f64,
    pub weight_live_interaction: f64,
    pub escore_whatsapp_engagement: i32,
    pub escore_live_presence: i32,
    pub escore_live_participation: i32,
    pub threshold_low_escore: i32,
    pub threshold_low_roizometer: i32,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            weight_whatsapp_text: 1.0,
            weight_whatsapp_audio: 1.5,
            weight_live_interaction: 2.0,
            escore_whatsapp_engagement: 40,
            escore_live_presence: 30,
            escore_live_participation: 30,
            threshold_low_escore: 30,
            threshold_low_roizometer: 30,
        }
    }
}
