use std::collections::BTreeMap;

use analysis_core::{
    ensure_window, first_match, stats, AlertLevel, AnalysisError, Band, Bound, Classification,
    PriceSeries,
};
use tracing::debug;

use crate::models::*;
use crate::relative::*;

pub struct DivergenceAnalyzer {
    config: DivergenceConfig,
}

impl Default for DivergenceAnalyzer {
    fn default() -> Self {
        Self::new(DivergenceConfig::default())
    }
}

impl DivergenceAnalyzer {
    pub fn new(config: DivergenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DivergenceConfig {
        &self.config
    }

    /// Flag assets trailing a benchmark that is not itself falling.
    pub fn detect(
        &self,
        assets: &BTreeMap<String, PriceSeries>,
        benchmark: &PriceSeries,
    ) -> Result<DivergenceResult, AnalysisError> {
        self.detect_over(assets, benchmark, self.config.window)
    }

    /// `detect` with an explicit return window.
    pub fn detect_over(
        &self,
        assets: &BTreeMap<String, PriceSeries>,
        benchmark: &PriceSeries,
        window: usize,
    ) -> Result<DivergenceResult, AnalysisError> {
        ensure_window("divergence window", window)?;

        let benchmark_return = window_return(&benchmark.closes(), window);
        let benchmark_holding = benchmark_return >= self.config.benchmark_floor;
        let cutoff = self.config.threshold * 100.0;

        let mut result = DivergenceResult {
            benchmark_return,
            ..Default::default()
        };

        for (id, series) in assets {
            if series.is_empty() {
                debug!("{}: no price history, skipped", id);
                continue;
            }
            let rs = relative_strength(series, benchmark, window)?;
            if rs.is_empty() {
                debug!("{}: no dates shared with the benchmark, skipped", id);
                continue;
            }
            let current_rs = rs.last().unwrap_or_else(|| {
                debug!("{}: no relative strength at the latest date, using 0", id);
                0.0
            });
            let asset_return = window_return(&series.closes(), window);
            let correlation =
                rolling_correlation(series, benchmark, self.config.correlation_window)?.last();

            result.relative_strength.insert(id.clone(), current_rs);
            result.asset_returns.insert(id.clone(), asset_return);
            result.correlation.insert(id.clone(), correlation);

            if benchmark_holding && current_rs < cutoff {
                result.details.push(DivergenceDetail {
                    asset: id.clone(),
                    relative_strength: current_rs,
                    asset_return,
                    message: format!(
                        "{} trails the benchmark by {:.2}% ({:+.2}% vs {:+.2}%)",
                        id,
                        current_rs.abs(),
                        asset_return,
                        benchmark_return
                    ),
                });
            }
        }

        if !result.details.is_empty() {
            let flagged: Vec<f64> = result.details.iter().map(|d| d.relative_strength).collect();
            result.detected = true;
            result.score = stats::mean(&flagged);
        }

        Ok(result)
    }

    fn score_bands() -> [Band<AlertLevel>; 3] {
        [
            Band::new(Bound::Below(-20.0), AlertLevel::Critical),
            Band::new(Bound::Below(-10.0), AlertLevel::Danger),
            Band::new(Bound::Always, AlertLevel::Warning),
        ]
    }

    pub fn classify_alert(&self, result: &DivergenceResult) -> Classification {
        if !result.detected {
            return Classification {
                level: AlertLevel::Safe,
                message: "No divergence from benchmark".to_string(),
                value: result.score,
                threshold: None,
            };
        }

        let bands = Self::score_bands();
        let (level, threshold) = first_match(result.score, &bands)
            .map(|band| (band.outcome, band.bound.threshold()))
            .unwrap_or((AlertLevel::Warning, None));

        Classification {
            level,
            message: format!(
                "{} high-beta asset(s) diverging, average relative strength {:.2}%",
                result.details.len(),
                result.score
            ),
            value: result.score,
            threshold,
        }
    }

    pub fn beta(&self, asset: &PriceSeries, benchmark: &PriceSeries) -> Result<f64, AnalysisError> {
        beta(
            asset,
            benchmark,
            self.config.beta_window,
            self.config.beta_min_observations,
        )
    }

    /// Rank assets by beta and look for high-beta names being sold while
    /// low-beta names hold up.
    pub fn analyze_liquidity_retreat(
        &self,
        assets: &BTreeMap<String, PriceSeries>,
        benchmark: &PriceSeries,
    ) -> Result<RetreatAnalysis, AnalysisError> {
        let mut metrics = Vec::with_capacity(assets.len());

        for (id, series) in assets {
            let rs = relative_strength(series, benchmark, self.config.retreat_window)?;
            if rs.is_empty() {
                debug!("{}: no aligned history, left out of the retreat ranking", id);
                continue;
            }
            metrics.push(AssetBeta {
                asset: id.clone(),
                beta: self.beta(series, benchmark)?,
                relative_strength_5d: rs.last().unwrap_or(0.0),
            });
        }

        Ok(classify_retreat(metrics, &self.config))
    }

    pub fn correlation_matrix(
        &self,
        assets: &BTreeMap<String, PriceSeries>,
    ) -> Result<Option<CorrelationMatrix>, AnalysisError> {
        correlation_matrix(assets, self.config.matrix_window)
    }
}

/// Retreat pattern from precomputed per-asset betas.
///
/// Needs at least two underperforming high-beta assets and one stable
/// low-beta asset; three or more underperformers make it severe.
pub fn classify_retreat(mut metrics: Vec<AssetBeta>, config: &DivergenceConfig) -> RetreatAnalysis {
    metrics.sort_by(|a, b| b.beta.total_cmp(&a.beta));

    let retreat_order: Vec<String> = metrics
        .iter()
        .filter(|m| {
            m.beta > config.retreat_high_beta && m.relative_strength_5d < config.retreat_underperform
        })
        .map(|m| m.asset.clone())
        .collect();

    let stable = metrics
        .iter()
        .filter(|m| m.beta < config.retreat_low_beta && m.relative_strength_5d > config.retreat_stable)
        .count();

    let detected = retreat_order.len() >= 2 && stable >= 1;
    let severity = match (detected, retreat_order.len()) {
        (false, _) => RetreatSeverity::None,
        (true, n) if n >= 3 => RetreatSeverity::High,
        (true, _) => RetreatSeverity::Medium,
    };

    RetreatAnalysis {
        detected,
        severity,
        retreat_order,
        metrics,
    }
}
