use crate::config::{AccountSettings, ROI_HALF_CAP, ROI_SCALE};
use crate::models::{Impact, RoiType, ValueEvent};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoiBreakdown {
    pub tangible: f64,
    pub intangible: f64,
}

impl RoiBreakdown {
    pub fn roizometer(&self) -> i32 {
        (self.tangible + self.intangible).round() as i32
    }
}

pub fn impact_score(impact: Impact) -> f64 {
    match impact {
        Impact::High => 3.0,
        Impact::Medium => 2.0,
        Impact::Low => 1.0,
    }
}

/// Weight for the channel an event was detected on. Audio is checked before text
/// so `whatsapp_audio` never falls through to the text weight.
pub fn source_weight(source: &str, settings: &AccountSettings) -> f64 {
    let source = source.to_ascii_lowercase();
    if source.contains("audio") {
        settings.weight_whatsapp_audio
    } else if source.contains("whatsapp") || source.contains("text") {
        settings.weight_whatsapp_text
    } else if source.contains("zoom") || source.contains("meet") || source.contains("live") {
        settings.weight_live_interaction
    } else {
        1.0
    }
}

fn scale_half(raw: f64) -> f64 {
    (raw * ROI_SCALE).clamp(0.0, ROI_HALF_CAP)
}

pub fn score_roi(events: &[ValueEvent], settings: &AccountSettings) -> RoiBreakdown {
    let (tangible_raw, intangible_raw) =
        events
            .iter()
            .fold((0.0_f64, 0.0_f64), |(tangible, intangible), event| {
                let weighted = impact_score(event.impact) * source_weight(&event.source, settings);
                match event.partition() {
                    RoiType::Tangible => (tangible + weighted, intangible),
                    RoiType::Intangible => (tangible, intangible + weighted),
                }
            });

    RoiBreakdown {
        tangible: scale_half(tangible_raw),
        intangible: scale_half(intangible_raw),
    }
}
