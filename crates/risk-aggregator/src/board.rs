//! Cross-category alert ranking.

use analysis_core::{most_severe, Alert};

/// The most severe alert; the earliest one wins ties. An empty board is
/// all clear.
pub fn highest_priority(alerts: &[Alert]) -> Alert {
    most_severe(alerts.iter(), |a| a.level)
        .cloned()
        .unwrap_or_else(Alert::all_clear)
}

/// Non-safe alerts, most severe first, input order kept among equals.
pub fn active_alerts(alerts: &[Alert]) -> Vec<Alert> {
    let mut active: Vec<Alert> = alerts
        .iter()
        .filter(|a| a.level.is_alert())
        .cloned()
        .collect();
    active.sort_by(|a, b| b.level.cmp(&a.level));
    active
}
