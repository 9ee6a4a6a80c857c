use crate::config::{AccountSettings, QUADRANT_CUTOFF, TREND_BAND};
use crate::models::{ClientStatus, Quadrant, ScoreSnapshot, Trend};

pub fn quadrant(escore: i32, roizometer: i32) -> Quadrant {
    match (escore >= QUADRANT_CUTOFF, roizometer >= QUADRANT_CUTOFF) {
        (true, true) => Quadrant::HighEHighRoi,
        (true, false) => Quadrant::HighELowRoi,
        (false, true) => Quadrant::LowEHighRoi,
        (false, false) => Quadrant::LowELowRoi,
    }
}

/// Compares the combined score with the most recent prior snapshot, if any.
pub fn trend(escore: i32, roizometer: i32, previous: Option<&ScoreSnapshot>) -> Trend {
    let Some(previous) = previous else {
        return Trend::Flat;
    };

    let diff = (escore + roizometer) - previous.combined();
    if diff > TREND_BAND {
        Trend::Up
    } else if diff < -TREND_BAND {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// `None` means leave the client's current status untouched.
pub fn status_change(
    escore: i32,
    roizometer: i32,
    settings: &AccountSettings,
) -> Option<ClientStatus> {
    if escore < settings.threshold_low_escore && roizometer < settings.threshold_low_roizometer {
        Some(ClientStatus::ChurnRisk)
    } else if escore >= QUADRANT_CUTOFF && roizometer >= QUADRANT_CUTOFF {
        Some(ClientStatus::Active)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn previous(escore: i32, roizometer: i32) -> ScoreSnapshot {
        ScoreSnapshot {
            account_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            escore,
            roizometer,
            quadrant: quadrant(escore, roizometer),
            trend: Trend::Flat,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn quadrant_cutoff_is_inclusive() {
        assert_eq!(quadrant(50, 50), Quadrant::HighEHighRoi);
        assert_eq!(quadrant(50, 49), Quadrant::HighELowRoi);
        assert_eq!(quadrant(49, 50), Quadrant::LowEHighRoi);
        assert_eq!(quadrant(49, 49), Quadrant::LowELowRoi);
        assert_eq!(quadrant(0, 0), Quadrant::LowELowRoi);
    }

    #[test]
    fn first_snapshot_is_flat() {
        assert_eq!(trend(100, 100, None), Trend::Flat);
        assert_eq!(trend(0, 0, None), Trend::Flat);
    }

    #[test]
    fn trend_band_edges_stay_flat() {
        let prior = previous(40, 40);
        assert_eq!(trend(45, 45, Some(&prior)), Trend::Flat);
        assert_eq!(trend(35, 35, Some(&prior)), Trend::Flat);
        assert_eq!(trend(46, 45, Some(&prior)), Trend::Up);
        assert_eq!(trend(34, 35, Some(&prior)), Trend::Down);
    }

    #[test]
    fn low_scores_flag_churn_risk() {
        let settings = AccountSettings::default();
        assert_eq!(status_change(10, 20, &settings), Some(ClientStatus::ChurnRisk));
    }

    #[test]
    fn high_scores_mark_active() {
        let settings = AccountSettings::default();
        assert_eq!(status_change(50, 50, &settings), Some(ClientStatus::Active));
    }

    #[test]
    fn middle_ground_leaves_status_alone() {
        let settings = AccountSettings::default();
        assert_eq!(status_change(10, 60, &settings), None);
        assert_eq!(status_change(40, 40, &settings), None);
        assert_eq!(status_change(70, 20, &settings), None);
    }

    #[test]
    fn thresholds_come_from_settings() {
        let settings = AccountSettings {
            threshold_low_escore: 60,
            threshold_low_roizometer: 60,
            ..AccountSettings::default()
        };
        assert_eq!(status_change(55, 55, &settings), Some(ClientStatus::ChurnRisk));
    }
}
