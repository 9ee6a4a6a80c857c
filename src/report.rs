use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AccountSettings;
use crate::error::Result;
use crate::models::{Quadrant, ScoreSnapshot, Trend};

const QUADRANTS: [Quadrant; 4] = [
    Quadrant::HighEHighRoi,
    Quadrant::HighELowRoi,
    Quadrant::LowEHighRoi,
    Quadrant::LowELowRoi,
];

pub fn quadrant_mix(snapshots: &[ScoreSnapshot]) -> Vec<(Quadrant, usize)> {
    QUADRANTS
        .iter()
        .map(|quadrant| {
            let count = snapshots
                .iter()
                .filter(|snapshot| snapshot.quadrant == *quadrant)
                .count();
            (*quadrant, count)
        })
        .collect()
}

pub fn trend_mix(snapshots: &[ScoreSnapshot]) -> BTreeMap<&'static str, usize> {
    let mut map = BTreeMap::new();
    for snapshot in snapshots {
        *map.entry(snapshot.trend.as_str()).or_insert(0) += 1;
    }
    map
}

/// Clients under both low thresholds, lowest combined score first.
pub fn at_risk<'a>(
    snapshots: &'a [ScoreSnapshot],
    settings: &AccountSettings,
) -> Vec<&'a ScoreSnapshot> {
    let mut flagged: Vec<&ScoreSnapshot> = snapshots
        .iter()
        .filter(|snapshot| {
            snapshot.escore < settings.threshold_low_escore
                && snapshot.roizometer < settings.threshold_low_roizometer
        })
        .collect();
    flagged.sort_by_key(|snapshot| snapshot.combined());
    flagged
}

pub fn build_report(
    account_id: Uuid,
    generated_at: DateTime<Utc>,
    snapshots: &[ScoreSnapshot],
    settings: &AccountSettings,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Client Engagement Report");
    let _ = writeln!(
        output,
        "Account {} ({} clients scored, generated {})",
        account_id,
        snapshots.len(),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Quadrant Mix");

    if snapshots.is_empty() {
        let _ = writeln!(output, "No snapshots recorded for this account.");
    } else {
        for (quadrant, count) in quadrant_mix(snapshots) {
            let _ = writeln!(output, "- {}: {}", quadrant.as_str(), count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trend Mix");

    let trends = trend_mix(snapshots);
    if trends.is_empty() {
        let _ = writeln!(output, "No snapshots recorded for this account.");
    } else {
        for (trend, count) in trends.iter() {
            let _ = writeln!(output, "- {trend}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Churn Risk");

    let flagged = at_risk(snapshots, settings);
    if flagged.is_empty() {
        let _ = writeln!(output, "No clients below the low-score thresholds.");
    } else {
        for snapshot in flagged.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} E-Score {} / ROIzometer {}",
                snapshot.client_id, snapshot.escore, snapshot.roizometer
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Movers");

    let movers: Vec<&ScoreSnapshot> = snapshots
        .iter()
        .filter(|snapshot| snapshot.trend != Trend::Flat)
        .collect();
    if movers.is_empty() {
        let _ = writeln!(output, "No clients moved beyond the trend band.");
    } else {
        for snapshot in movers {
            let _ = writeln!(
                output,
                "- {} {} ({}, combined {})",
                snapshot.client_id,
                snapshot.trend.as_str(),
                snapshot.quadrant.as_str(),
                snapshot.combined()
            );
        }
    }

    output
}

pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;

    fn snapshot(escore: i32, roizometer: i32, trend: Trend) -> ScoreSnapshot {
        ScoreSnapshot {
            account_id: Uuid::nil(),
            client_id: Uuid::new_v4(),
            escore,
            roizometer,
            quadrant: classify::quadrant(escore, roizometer),
            trend,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn quadrant_mix_counts_every_quadrant() {
        let snapshots = vec![
            snapshot(80, 80, Trend::Flat),
            snapshot(60, 10, Trend::Up),
            snapshot(10, 10, Trend::Down),
            snapshot(5, 5, Trend::Flat),
        ];
        let mix = quadrant_mix(&snapshots);
        assert_eq!(mix.len(), 4);
        assert_eq!(mix[0], (Quadrant::HighEHighRoi, 1));
        assert_eq!(mix[1], (Quadrant::HighELowRoi, 1));
        assert_eq!(mix[2], (Quadrant::LowEHighRoi, 0));
        assert_eq!(mix[3], (Quadrant::LowELowRoi, 2));
    }

    #[test]
    fn at_risk_orders_lowest_first() {
        let snapshots = vec![
            snapshot(20, 20, Trend::Flat),
            snapshot(5, 5, Trend::Flat),
            snapshot(70, 70, Trend::Flat),
        ];
        let flagged = at_risk(&snapshots, &AccountSettings::default());
        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].combined(), 10);
        assert_eq!(flagged[1].combined(), 40);
    }

    #[test]
    fn report_lists_sections() {
        let snapshots = vec![snapshot(10, 10, Trend::Down), snapshot(90, 60, Trend::Flat)];
        let report = build_report(
            Uuid::nil(),
            Utc::now(),
            &snapshots,
            &AccountSettings::default(),
        );
        assert!(report.contains("## Quadrant Mix"));
        assert!(report.contains("- highE_highROI: 1"));
        assert!(report.contains("- down: 1"));
        assert!(report.contains(&snapshots[0].client_id.to_string()));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(Uuid::nil(), Utc::now(), &[], &AccountSettings::default());
        assert!(report.contains("No snapshots recorded for this account."));
        assert!(report.contains("No clients below the low-score thresholds."));
    }

    #[test]
    fn write_report_persists_contents() {
        let path = std::env::temp_dir().join(format!("scoring-report-{}.md", Uuid::new_v4()));
        let report = build_report(Uuid::nil(), Utc::now(), &[], &AccountSettings::default());
        write_report(&path, &report).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn write_report_to_missing_directory_is_io_error() {
        let path = std::env::temp_dir()
            .join(format!("scoring-missing-{}", Uuid::new_v4()))
            .join("report.md");
        let err = write_report(&path, "# Report").unwrap_err();
        assert!(matches!(err, crate::error::ScoringError::Io(_)));
    }
}
