use analysis_core::{Alert, AlertCategory, AlertLevel, PriceSeries};
use chrono::NaiveDate;
use divergence_analysis::DivergenceResult;
use spread_analysis::{SpreadAnalyzer, SpreadStatistics};
use volatility_analysis::VolatilityMetrics;

use crate::*;

fn spread_stats(current: f64) -> SpreadStatistics {
    let us = PriceSeries::from_closes(
        "US10Y",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        &[current + 1.0, current + 0.5, current],
    )
    .unwrap();
    let series = SpreadAnalyzer::compute_spread(&us, &0.0.into());
    SpreadAnalyzer::statistics(&series).unwrap()
}

fn volatility(percentile: f64) -> VolatilityMetrics {
    VolatilityMetrics {
        hv_percentile: percentile,
        ..Default::default()
    }
}

fn divergence(score: f64) -> DivergenceResult {
    DivergenceResult {
        detected: true,
        score,
        ..Default::default()
    }
}

fn alert(level: AlertLevel, category: AlertCategory, message: &str) -> Alert {
    Alert {
        level,
        category,
        message: message.to_string(),
        value: 0.0,
        threshold: None,
    }
}

#[test]
fn test_maximum_composite_score() {
    let aggregator = RiskAggregator::default();
    let risk = aggregator.composite_score(
        Some(&spread_stats(1.0)),
        &volatility(97.0),
        &divergence(-25.0),
    );

    assert_eq!(risk.score, 100.0);
    assert_eq!(risk.factors.len(), 3);
    assert!(risk.factors[0].starts_with("Spread extremely compressed"));
    assert!(risk.factors[1].starts_with("Volatility at extreme level"));
    assert!(risk.factors[2].starts_with("Severe asset divergence"));
    assert_eq!(risk.level(), AlertLevel::Critical);
}

#[test]
fn test_quiet_market_scores_zero() {
    let risk = RiskAggregator::default().composite_score(
        Some(&spread_stats(3.5)),
        &volatility(30.0),
        &DivergenceResult::default(),
    );

    assert_eq!(risk.score, 0.0);
    assert!(risk.factors.is_empty());
    assert_eq!(risk.level(), AlertLevel::Safe);
}

#[test]
fn test_each_category_scores_only_its_first_band() {
    let aggregator = RiskAggregator::default();

    let risk = aggregator.composite_score(
        Some(&spread_stats(2.0)),
        &volatility(80.0),
        &divergence(-10.0),
    );
    // 30 + 20 + 10: -10 is not beyond the 10-point divergence line
    assert_eq!(risk.score, 60.0);
    assert_eq!(risk.level(), AlertLevel::Danger);
    assert!(risk.factors[2].starts_with("Mild asset divergence"));

    let risk = aggregator.composite_score(
        Some(&spread_stats(2.8)),
        &volatility(65.0),
        &divergence(-12.0),
    );
    assert_eq!(risk.score, 40.0);
    assert_eq!(risk.level(), AlertLevel::Warning);
}

#[test]
fn test_missing_spread_contributes_nothing() {
    let risk = RiskAggregator::default().composite_score(
        None,
        &volatility(96.0),
        &DivergenceResult::default(),
    );
    assert_eq!(risk.score, 30.0);
    assert_eq!(risk.factors.len(), 1);
}

#[test]
fn test_gauge_bands() {
    let at = |score: f64| RiskScore {
        score,
        factors: Vec::new(),
    };
    assert_eq!(at(24.9).level(), AlertLevel::Safe);
    assert_eq!(at(25.0).level(), AlertLevel::Warning);
    assert_eq!(at(50.0).level(), AlertLevel::Danger);
    assert_eq!(at(75.0).level(), AlertLevel::Critical);
    assert_eq!(at(110.0).level(), AlertLevel::Critical);
}

#[test]
fn test_highest_priority_earliest_wins_ties() {
    let alerts = vec![
        alert(AlertLevel::Warning, AlertCategory::Spread, "spread"),
        alert(AlertLevel::Danger, AlertCategory::Volatility, "daily move"),
        alert(AlertLevel::Danger, AlertCategory::Divergence, "divergence"),
    ];

    let top = highest_priority(&alerts);
    assert_eq!(top.level, AlertLevel::Danger);
    assert_eq!(top.category, AlertCategory::Volatility);
}

#[test]
fn test_empty_board_is_all_clear() {
    let top = highest_priority(&[]);
    assert_eq!(top.level, AlertLevel::Safe);
    assert_eq!(top.category, AlertCategory::System);
    assert_eq!(top.message, "All clear");
}

#[test]
fn test_active_alerts_sorted_and_stable() {
    let alerts = vec![
        alert(AlertLevel::Safe, AlertCategory::Spread, "ok"),
        alert(AlertLevel::Warning, AlertCategory::Volatility, "first warning"),
        alert(AlertLevel::Critical, AlertCategory::Divergence, "critical"),
        alert(AlertLevel::Warning, AlertCategory::Spread, "second warning"),
    ];

    let active = active_alerts(&alerts);
    let messages: Vec<&str> = active.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, vec!["critical", "first warning", "second warning"]);
}

#[test]
fn test_scoring_bands_round_trip_json() {
    let bands = ScoringBands::default();
    let json = serde_json::to_string(&bands).unwrap();
    let parsed: ScoringBands = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, bands);
}
