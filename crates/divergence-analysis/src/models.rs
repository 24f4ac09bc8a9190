use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Windows and cutoffs for divergence and liquidity-retreat detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceConfig {
    /// Relative strength below `threshold * 100` flags an asset (negative fraction)
    pub threshold: f64,
    pub window: usize,
    pub correlation_window: usize,
    /// Benchmark return (%) below which divergence is not evaluated
    pub benchmark_floor: f64,
    pub beta_window: usize,
    pub beta_min_observations: usize,
    pub retreat_high_beta: f64,
    pub retreat_low_beta: f64,
    pub retreat_window: usize,
    /// Relative strength (%) under which a high-beta asset is underperforming
    pub retreat_underperform: f64,
    /// Relative strength (%) above which a low-beta asset is stable
    pub retreat_stable: f64,
    pub matrix_window: usize,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            threshold: -0.05,
            window: 20,
            correlation_window: 30,
            benchmark_floor: -2.0,
            beta_window: 60,
            beta_min_observations: 20,
            retreat_high_beta: 1.2,
            retreat_low_beta: 1.0,
            retreat_window: 5,
            retreat_underperform: -5.0,
            retreat_stable: -2.0,
            matrix_window: 60,
        }
    }
}

/// A flagged asset and how far it trails the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceDetail {
    pub asset: String,
    pub relative_strength: f64,
    pub asset_return: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivergenceResult {
    /// Benchmark return over the window (%)
    pub benchmark_return: f64,
    pub asset_returns: BTreeMap<String, f64>,
    /// Latest relative strength per asset (%)
    pub relative_strength: BTreeMap<String, f64>,
    /// Latest rolling correlation per asset, when defined
    pub correlation: BTreeMap<String, Option<f64>>,
    pub detected: bool,
    /// Mean relative strength of the flagged assets; 0 when none
    pub score: f64,
    pub details: Vec<DivergenceDetail>,
}

impl DivergenceResult {
    pub fn messages(&self) -> Vec<String> {
        self.details.iter().map(|d| d.message.clone()).collect()
    }

    pub fn flagged_assets(&self) -> Vec<&str> {
        self.details.iter().map(|d| d.asset.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetreatSeverity {
    #[default]
    None,
    Medium,
    High,
}

impl RetreatSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetreatSeverity::None => "none",
            RetreatSeverity::Medium => "medium",
            RetreatSeverity::High => "high",
        }
    }
}

/// Beta and short-window relative strength of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBeta {
    pub asset: String,
    pub beta: f64,
    pub relative_strength_5d: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetreatAnalysis {
    pub detected: bool,
    pub severity: RetreatSeverity,
    /// Underperforming high-beta assets, highest beta first
    pub retreat_order: Vec<String>,
    /// Every analyzed asset, highest beta first
    pub metrics: Vec<AssetBeta>,
}

/// Symmetric matrix of pairwise return correlations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub assets: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        Some(self.values[i][j])
    }
}
