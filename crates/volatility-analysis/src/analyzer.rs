use analysis_core::{
    first_match, most_severe, stats, AlertLevel, AnalysisError, Band, Bound, Classification,
    PriceSeries,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::*;

/// Windows and alert lines for the volatility snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityConfig {
    pub window: usize,
    pub atr_window: usize,
    /// Trailing HV observations the percentile is ranked against
    pub lookback: usize,
    /// |daily change| at or above this (%) is dangerous
    pub daily_move: f64,
    /// |weekly change| at or above this (%) is dangerous
    pub weekly_move: f64,
    pub percentile_high: f64,
    pub percentile_extreme: f64,
    /// 5-day HV mean above this multiple of the 20-day mean is a spike
    pub spike_ratio: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            atr_window: 14,
            lookback: 252,
            daily_move: 2.0,
            weekly_move: 5.0,
            percentile_high: 80.0,
            percentile_extreme: 95.0,
            spike_ratio: 1.5,
        }
    }
}

/// Latest-value volatility snapshot for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Annualized historical volatility (%)
    pub historical_volatility: f64,
    pub atr: f64,
    pub atr_percent: f64,
    /// Rank of current HV within the lookback (0-100)
    pub hv_percentile: f64,
    pub daily_change: f64,
    pub hv_mean: f64,
    pub hv_std: f64,
    pub max_daily_change_5d: f64,
    pub weekly_range: f64,
}

impl Default for VolatilityMetrics {
    fn default() -> Self {
        Self {
            historical_volatility: 0.0,
            atr: 0.0,
            atr_percent: 0.0,
            hv_percentile: 50.0,
            daily_change: 0.0,
            hv_mean: 0.0,
            hv_std: 0.0,
            max_daily_change_5d: 0.0,
            weekly_range: 0.0,
        }
    }
}

pub struct VolatilityAnalyzer {
    config: VolatilityConfig,
}

impl Default for VolatilityAnalyzer {
    fn default() -> Self {
        Self::new(VolatilityConfig::default())
    }
}

impl VolatilityAnalyzer {
    pub fn new(config: VolatilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VolatilityConfig {
        &self.config
    }

    /// Aggregate every indicator at its latest defined value.
    pub fn snapshot(&self, prices: &PriceSeries) -> Result<VolatilityMetrics, AnalysisError> {
        if prices.is_empty() {
            debug!("{}: empty price series, neutral volatility snapshot", prices.symbol());
            return Ok(VolatilityMetrics::default());
        }

        let hv = historical_volatility(prices, self.config.window)?;
        let atr = average_true_range(prices, self.config.atr_window)?;
        let atr_pct = atr_percent(prices, self.config.atr_window)?;
        let changes = daily_change(prices);
        let hv_values = hv.defined();

        let max_daily_change_5d = if changes.len() >= 5 {
            changes
                .tail(5)
                .iter()
                .filter_map(|p| p.value)
                .map(f64::abs)
                .fold(0.0, f64::max)
        } else {
            0.0
        };

        Ok(VolatilityMetrics {
            historical_volatility: hv.latest().unwrap_or(0.0),
            atr: atr.latest().unwrap_or(0.0),
            atr_percent: atr_pct.latest().unwrap_or(0.0),
            hv_percentile: percentile_rank(&hv, self.config.lookback)?,
            daily_change: changes.latest().unwrap_or(0.0),
            hv_mean: stats::mean(&hv_values),
            hv_std: stats::std_dev(&hv_values),
            max_daily_change_5d,
            weekly_range: weekly_range(prices),
        })
    }

    fn percentile_bands(&self) -> [Band<AlertLevel>; 2] {
        [
            Band::new(
                Bound::AtLeast(self.config.percentile_extreme),
                AlertLevel::Critical,
            ),
            Band::new(Bound::AtLeast(self.config.percentile_high), AlertLevel::Warning),
        ]
    }

    /// Evaluate the daily-move, weekly-move and percentile conditions
    /// independently and report the most severe one. Equal severities keep
    /// the earlier condition in that order.
    pub fn classify_alert(
        &self,
        daily_change_pct: f64,
        weekly_change_pct: f64,
        hv_percentile: f64,
    ) -> Classification {
        let mut fired = Vec::new();

        if Bound::AtLeast(self.config.daily_move).matches(daily_change_pct.abs()) {
            fired.push(Classification {
                level: AlertLevel::Danger,
                message: format!("Daily move {:+.2}%", daily_change_pct),
                value: daily_change_pct,
                threshold: Some(self.config.daily_move),
            });
        }

        if Bound::AtLeast(self.config.weekly_move).matches(weekly_change_pct.abs()) {
            fired.push(Classification {
                level: AlertLevel::Danger,
                message: format!("Weekly move {:+.2}%", weekly_change_pct),
                value: weekly_change_pct,
                threshold: Some(self.config.weekly_move),
            });
        }

        if let Some(band) = first_match(hv_percentile, &self.percentile_bands()) {
            let message = match band.outcome {
                AlertLevel::Critical => {
                    format!("Volatility at historical extreme ({:.0}th percentile)", hv_percentile)
                }
                _ => format!("Volatility elevated ({:.0}th percentile)", hv_percentile),
            };
            fired.push(Classification {
                level: band.outcome,
                message,
                value: hv_percentile,
                threshold: band.bound.threshold(),
            });
        }

        most_severe(fired, |c| c.level).unwrap_or_else(|| Classification {
            level: AlertLevel::Safe,
            message: "Volatility normal".to_string(),
            value: hv_percentile,
            threshold: None,
        })
    }

    /// Classify a snapshot, using its weekly range as the weekly move.
    pub fn classify_metrics(&self, metrics: &VolatilityMetrics) -> Classification {
        self.classify_alert(metrics.daily_change, metrics.weekly_range, metrics.hv_percentile)
    }

    /// Mean of the last 5 HV readings exceeds `spike_ratio` times the mean
    /// of the last 20.
    pub fn is_spiking(&self, prices: &PriceSeries) -> Result<bool, AnalysisError> {
        let hv = historical_volatility(prices, self.config.window)?.defined();
        if hv.len() < 20 {
            return Ok(false);
        }

        let recent_5 = stats::mean(&hv[hv.len() - 5..]);
        let recent_20 = stats::mean(&hv[hv.len() - 20..]);
        Ok(recent_5 > recent_20 * self.config.spike_ratio)
    }
}
