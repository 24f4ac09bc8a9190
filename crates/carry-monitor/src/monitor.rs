use std::collections::BTreeMap;

use analysis_core::{Alert, AlertCategory, AlertLevel, AnalysisError, PriceSeries};
use chrono::{DateTime, Utc};
use divergence_analysis::{
    CorrelationMatrix, DivergenceAnalyzer, DivergenceResult, RetreatAnalysis,
};
use risk_aggregator::{active_alerts, highest_priority, RiskAggregator, RiskScore};
use serde::{Deserialize, Serialize};
use spread_analysis::{
    CounterpartYield, SpreadAnalyzer, SpreadSeries, SpreadStatistics, SpreadTrend,
};
use tracing::{info, warn};
use volatility_analysis::{VolatilityAnalyzer, VolatilityMetrics};

use crate::config::MonitorConfig;

/// Materialized series for one pass.
#[derive(Debug, Clone)]
pub struct MonitorInputs {
    pub us_yield: PriceSeries,
    pub counterpart: CounterpartYield,
    /// Instrument the volatility snapshot is taken on
    pub fx: PriceSeries,
    pub benchmark: PriceSeries,
    pub high_beta: BTreeMap<String, PriceSeries>,
    /// Extra assets used only for the retreat ranking
    pub retreat_extras: BTreeMap<String, PriceSeries>,
}

impl MonitorInputs {
    /// High-beta basket plus the retreat-only extras.
    pub fn retreat_basket(&self) -> BTreeMap<String, PriceSeries> {
        let mut basket = self.high_beta.clone();
        for (id, series) in &self.retreat_extras {
            basket.entry(id.clone()).or_insert_with(|| series.clone());
        }
        basket
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadReport {
    pub series: SpreadSeries,
    pub statistics: Option<SpreadStatistics>,
    pub trend: SpreadTrend,
    pub velocity_5d: f64,
    pub velocity_20d: f64,
    pub accelerating: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReport {
    pub symbol: String,
    pub metrics: VolatilityMetrics,
    pub spiking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorReport {
    pub generated_at: DateTime<Utc>,
    pub spread: SpreadReport,
    pub volatility: VolatilityReport,
    pub divergence: DivergenceResult,
    pub retreat: RetreatAnalysis,
    pub correlation: Option<CorrelationMatrix>,
    /// Non-safe alerts, most severe first
    pub alerts: Vec<Alert>,
    pub highest_priority: Alert,
    pub risk: RiskScore,
    pub risk_level: AlertLevel,
}

struct DivergencePass {
    result: DivergenceResult,
    retreat: RetreatAnalysis,
    correlation: Option<CorrelationMatrix>,
}

pub struct CarryMonitor {
    spread: SpreadAnalyzer,
    volatility: VolatilityAnalyzer,
    divergence: DivergenceAnalyzer,
    aggregator: RiskAggregator,
}

impl Default for CarryMonitor {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

impl CarryMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            spread: SpreadAnalyzer::new(config.spread.clone()),
            volatility: VolatilityAnalyzer::new(config.volatility.clone()),
            divergence: DivergenceAnalyzer::new(config.divergence.clone()),
            aggregator: RiskAggregator::default(),
        }
    }

    /// One snapshot. The three analyzers run concurrently; alerts and the
    /// composite score are built once all of them are done.
    pub fn run(&self, inputs: &MonitorInputs) -> Result<MonitorReport, AnalysisError> {
        for (name, series) in [
            ("US yield", &inputs.us_yield),
            ("FX", &inputs.fx),
            ("benchmark", &inputs.benchmark),
        ] {
            if series.is_empty() {
                warn!("{} series {} is empty", name, series.symbol());
            }
        }

        let ((spread, volatility), divergence) = rayon::join(
            || {
                rayon::join(
                    || self.spread_pass(inputs),
                    || self.volatility_pass(&inputs.fx),
                )
            },
            || self.divergence_pass(inputs),
        );
        let (spread, volatility, divergence) = (spread?, volatility?, divergence?);

        let mut alerts = Vec::with_capacity(3);
        if let Some(stats) = &spread.statistics {
            alerts.push(
                self.spread
                    .classify_alert(stats.current)
                    .into_alert(AlertCategory::Spread),
            );
        }
        alerts.push(
            self.volatility
                .classify_metrics(&volatility.metrics)
                .into_alert(AlertCategory::Volatility),
        );
        alerts.push(
            self.divergence
                .classify_alert(&divergence.result)
                .into_alert(AlertCategory::Divergence),
        );

        let top = highest_priority(&alerts);
        let alerts = active_alerts(&alerts);
        for alert in &alerts {
            info!(level = %alert.level, category = %alert.category, "{}", alert.message);
        }

        let risk = self.aggregator.composite_score(
            spread.statistics.as_ref(),
            &volatility.metrics,
            &divergence.result,
        );
        let risk_level = risk.level();
        info!(
            score = risk.score,
            level = %risk_level,
            alerts = alerts.len(),
            "carry monitor pass complete"
        );

        Ok(MonitorReport {
            generated_at: Utc::now(),
            spread,
            volatility,
            divergence: divergence.result,
            retreat: divergence.retreat,
            correlation: divergence.correlation,
            alerts,
            highest_priority: top,
            risk,
            risk_level,
        })
    }

    fn spread_pass(&self, inputs: &MonitorInputs) -> Result<SpreadReport, AnalysisError> {
        let series = SpreadAnalyzer::compute_spread(&inputs.us_yield, &inputs.counterpart);

        Ok(SpreadReport {
            statistics: SpreadAnalyzer::statistics(&series),
            trend: self.spread.trend(&series)?,
            velocity_5d: SpreadAnalyzer::velocity(&series, 5)?,
            velocity_20d: SpreadAnalyzer::velocity(&series, 20)?,
            accelerating: SpreadAnalyzer::is_accelerating(&series),
            series,
        })
    }

    fn volatility_pass(&self, fx: &PriceSeries) -> Result<VolatilityReport, AnalysisError> {
        Ok(VolatilityReport {
            symbol: fx.symbol().to_string(),
            metrics: self.volatility.snapshot(fx)?,
            spiking: self.volatility.is_spiking(fx)?,
        })
    }

    fn divergence_pass(&self, inputs: &MonitorInputs) -> Result<DivergencePass, AnalysisError> {
        let basket = inputs.retreat_basket();
        Ok(DivergencePass {
            result: self.divergence.detect(&inputs.high_beta, &inputs.benchmark)?,
            retreat: self
                .divergence
                .analyze_liquidity_retreat(&basket, &inputs.benchmark)?,
            correlation: self.divergence.correlation_matrix(&basket)?,
        })
    }
}
