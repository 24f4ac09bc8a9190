use analysis_core::stats;
use analysis_core::{
    ensure_window, first_match, AlertLevel, AnalysisError, Band, Bound, Classification,
    PriceSeries,
};
use tracing::debug;

use crate::models::*;

pub struct SpreadAnalyzer {
    config: SpreadConfig,
}

impl Default for SpreadAnalyzer {
    fn default() -> Self {
        Self::new(SpreadConfig::default())
    }
}

impl SpreadAnalyzer {
    pub fn new(config: SpreadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }

    /// Spread = US yield - counterpart yield, on every US yield date.
    /// Dates the counterpart does not cover carry an undefined spread.
    pub fn compute_spread(us_yield: &PriceSeries, counterpart: &CounterpartYield) -> SpreadSeries {
        if us_yield.is_empty() {
            debug!("US yield series is empty, no spread computed");
            return SpreadSeries::default();
        }

        let points = us_yield
            .bars()
            .iter()
            .map(|bar| {
                let counterpart_yield = counterpart.on(bar.date);
                SpreadPoint {
                    date: bar.date,
                    us_yield: bar.close,
                    counterpart_yield,
                    spread: counterpart_yield.map(|c| bar.close - c),
                }
            })
            .collect();

        SpreadSeries { points }
    }

    /// Summary statistics over the defined spreads; `None` when there are none.
    pub fn statistics(series: &SpreadSeries) -> Option<SpreadStatistics> {
        let spreads = series.spreads();
        let current = *spreads.last()?;

        let change = |n: usize| -> f64 {
            if spreads.len() > n {
                current - spreads[spreads.len() - 1 - n]
            } else {
                0.0
            }
        };

        Some(SpreadStatistics {
            current,
            mean: stats::mean(&spreads),
            std: stats::std_dev(&spreads),
            min: spreads.iter().copied().fold(f64::INFINITY, f64::min),
            max: spreads.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            percentile: stats::percent_below(current, &spreads),
            change_1d: change(1),
            change_5d: change(5),
            change_20d: change(20),
            observations: spreads.len(),
        })
    }

    /// Trend over the configured window.
    pub fn trend(&self, series: &SpreadSeries) -> Result<SpreadTrend, AnalysisError> {
        self.trend_over(series, self.config.trend_window)
    }

    /// Trend from the least-squares slope of the last `window` spreads.
    pub fn trend_over(
        &self,
        series: &SpreadSeries,
        window: usize,
    ) -> Result<SpreadTrend, AnalysisError> {
        ensure_window("trend window", window)?;

        let spreads = series.spreads();
        if spreads.is_empty() {
            return Ok(SpreadTrend::Unknown);
        }
        if spreads.len() < window {
            return Ok(SpreadTrend::InsufficientData);
        }

        let slope = stats::ols_slope(&spreads[spreads.len() - window..]);
        let flat = self.config.trend_slope;

        Ok(if slope < -flat {
            SpreadTrend::Narrowing
        } else if slope > flat {
            SpreadTrend::Widening
        } else {
            SpreadTrend::Oscillating
        })
    }

    /// Average daily change over the trailing `window` spreads:
    /// `(last - first) / window`. Negative means narrowing.
    pub fn velocity(series: &SpreadSeries, window: usize) -> Result<f64, AnalysisError> {
        ensure_window("velocity window", window)?;

        let spreads = series.spreads();
        if spreads.len() < window {
            return Ok(0.0);
        }
        let recent = &spreads[spreads.len() - window..];
        Ok((recent[recent.len() - 1] - recent[0]) / window as f64)
    }

    /// Narrowing, and narrowing faster over 5 days than over 20.
    /// A flat or widening 20-day drift never counts as acceleration.
    pub fn is_accelerating(series: &SpreadSeries) -> bool {
        let v5 = Self::velocity(series, 5).unwrap_or(0.0);
        let v20 = Self::velocity(series, 20).unwrap_or(0.0);
        v20 < 0.0 && v5 < v20
    }

    fn bands(&self) -> [Band<AlertLevel>; 3] {
        [
            Band::new(Bound::AtMost(self.config.critical), AlertLevel::Critical),
            Band::new(Bound::AtMost(self.config.danger), AlertLevel::Danger),
            Band::new(Bound::AtMost(self.config.warning), AlertLevel::Warning),
        ]
    }

    /// Lower spread is worse; bands are scanned from most severe down.
    pub fn classify_alert(&self, current_spread: f64) -> Classification {
        match first_match(current_spread, &self.bands()) {
            Some(band) => {
                let line = band.bound.threshold().unwrap_or_default();
                Classification {
                    level: band.outcome,
                    message: format!(
                        "Spread at {:.2}% is at or below the {} line ({:.2}%)",
                        current_spread, band.outcome, line
                    ),
                    value: current_spread,
                    threshold: band.bound.threshold(),
                }
            }
            None => Classification {
                level: AlertLevel::Safe,
                message: format!("Spread at {:.2}%", current_spread),
                value: current_spread,
                threshold: None,
            },
        }
    }
}
