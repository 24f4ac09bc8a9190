use analysis_core::{first_match, AlertLevel, Band, Bound};
use divergence_analysis::DivergenceResult;
use serde::{Deserialize, Serialize};
use spread_analysis::SpreadStatistics;
use tracing::debug;
use volatility_analysis::VolatilityMetrics;

/// Points awarded by one band and the factor it reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub points: f64,
    pub factor: String,
}

impl ScoreBand {
    fn band(bound: Bound, points: f64, factor: &str) -> Band<ScoreBand> {
        Band::new(
            bound,
            ScoreBand {
                points,
                factor: factor.to_string(),
            },
        )
    }
}

/// Per-category point tables. Each table is scanned top-down and only the
/// first matching band scores, which caps every category at its first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringBands {
    /// Matched against the current spread (%)
    pub spread: Vec<Band<ScoreBand>>,
    /// Matched against the HV percentile
    pub volatility: Vec<Band<ScoreBand>>,
    /// Matched against |divergence score|, only when divergence is detected
    pub divergence: Vec<Band<ScoreBand>>,
}

impl Default for ScoringBands {
    fn default() -> Self {
        Self {
            spread: vec![
                ScoreBand::band(Bound::AtMost(1.5), 40.0, "Spread extremely compressed"),
                ScoreBand::band(Bound::AtMost(2.0), 30.0, "Spread dangerously narrow"),
                ScoreBand::band(Bound::AtMost(2.5), 20.0, "Spread at warning line"),
                ScoreBand::band(Bound::AtMost(3.0), 10.0, "Spread at low level"),
            ],
            volatility: vec![
                ScoreBand::band(Bound::AtLeast(95.0), 30.0, "Volatility at extreme level"),
                ScoreBand::band(Bound::AtLeast(80.0), 20.0, "Volatility elevated"),
                ScoreBand::band(Bound::AtLeast(60.0), 10.0, "Volatility rising"),
            ],
            divergence: vec![
                ScoreBand::band(Bound::Above(20.0), 30.0, "Severe asset divergence"),
                ScoreBand::band(Bound::Above(10.0), 20.0, "Significant asset divergence"),
                ScoreBand::band(Bound::Always, 10.0, "Mild asset divergence"),
            ],
        }
    }
}

/// Composite risk score (nominally 0-100) and the factors behind it, in
/// spread, volatility, divergence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: f64,
    pub factors: Vec<String>,
}

impl RiskScore {
    /// Gauge band for the score as a fraction of 100.
    pub fn level(&self) -> AlertLevel {
        let gauge = [
            Band::new(Bound::Below(0.25), AlertLevel::Safe),
            Band::new(Bound::Below(0.5), AlertLevel::Warning),
            Band::new(Bound::Below(0.75), AlertLevel::Danger),
            Band::new(Bound::Always, AlertLevel::Critical),
        ];
        first_match(self.score / 100.0, &gauge)
            .map(|band| band.outcome)
            .unwrap_or(AlertLevel::Critical)
    }

    fn add(&mut self, bands: &[Band<ScoreBand>], value: f64, unit: &str) {
        if let Some(band) = first_match(value, bands) {
            self.score += band.outcome.points;
            self.factors
                .push(format!("{} ({:.1}{})", band.outcome.factor, value, unit));
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    bands: ScoringBands,
}

impl RiskAggregator {
    pub fn new(bands: ScoringBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &ScoringBands {
        &self.bands
    }

    /// Additive score across the three categories. Missing spread
    /// statistics contribute nothing.
    pub fn composite_score(
        &self,
        spread: Option<&SpreadStatistics>,
        volatility: &VolatilityMetrics,
        divergence: &DivergenceResult,
    ) -> RiskScore {
        let mut risk = RiskScore::default();

        match spread {
            Some(stats) => risk.add(&self.bands.spread, stats.current, "%"),
            None => debug!("no spread statistics, spread contributes 0 points"),
        }

        risk.add(&self.bands.volatility, volatility.hv_percentile, "th percentile");

        if divergence.detected {
            risk.add(&self.bands.divergence, divergence.score.abs(), "% shortfall");
        }

        risk
    }
}
