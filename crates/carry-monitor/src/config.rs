use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use divergence_analysis::DivergenceConfig;
use serde::{Deserialize, Serialize};
use spread_analysis::SpreadConfig;
use volatility_analysis::VolatilityConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub spread: SpreadConfig,
    pub volatility: VolatilityConfig,
    pub divergence: DivergenceConfig,
    /// Counterpart yield (%) used when no counterpart data is supplied
    pub counterpart_yield: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            spread: SpreadConfig::default(),
            volatility: VolatilityConfig::default(),
            divergence: DivergenceConfig::default(),
            counterpart_yield: 1.0,
        }
    }
}

/// `key` parsed from the environment, or `default` when unset.
fn read<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let spread = SpreadConfig::default();
        let volatility = VolatilityConfig::default();
        let divergence = DivergenceConfig::default();

        let config = Self {
            spread: SpreadConfig {
                critical: read("SPREAD_CRITICAL", spread.critical)?,
                danger: read("SPREAD_DANGER", spread.danger)?,
                warning: read("SPREAD_WARNING", spread.warning)?,
                trend_window: read("SPREAD_TREND_WINDOW", spread.trend_window)?,
                trend_slope: read("SPREAD_TREND_SLOPE", spread.trend_slope)?,
            },
            volatility: VolatilityConfig {
                window: read("VOL_WINDOW", volatility.window)?,
                atr_window: read("ATR_WINDOW", volatility.atr_window)?,
                lookback: read("VOL_LOOKBACK", volatility.lookback)?,
                daily_move: read("VOL_DAILY_MOVE", volatility.daily_move)?,
                weekly_move: read("VOL_WEEKLY_MOVE", volatility.weekly_move)?,
                percentile_high: read("VOL_PERCENTILE_HIGH", volatility.percentile_high)?,
                percentile_extreme: read("VOL_PERCENTILE_EXTREME", volatility.percentile_extreme)?,
                spike_ratio: volatility.spike_ratio,
            },
            divergence: DivergenceConfig {
                threshold: read("DIVERGENCE_THRESHOLD", divergence.threshold)?,
                window: read("RELATIVE_STRENGTH_WINDOW", divergence.window)?,
                correlation_window: read("CORRELATION_WINDOW", divergence.correlation_window)?,
                benchmark_floor: read("BENCHMARK_FLOOR", divergence.benchmark_floor)?,
                beta_window: read("BETA_WINDOW", divergence.beta_window)?,
                beta_min_observations: read(
                    "BETA_MIN_OBSERVATIONS",
                    divergence.beta_min_observations,
                )?,
                retreat_high_beta: read("RETREAT_HIGH_BETA", divergence.retreat_high_beta)?,
                retreat_low_beta: read("RETREAT_LOW_BETA", divergence.retreat_low_beta)?,
                retreat_window: read("RETREAT_WINDOW", divergence.retreat_window)?,
                retreat_underperform: read(
                    "RETREAT_UNDERPERFORM",
                    divergence.retreat_underperform,
                )?,
                retreat_stable: read("RETREAT_STABLE", divergence.retreat_stable)?,
                matrix_window: read("CORRELATION_MATRIX_WINDOW", divergence.matrix_window)?,
            },
            counterpart_yield: read("COUNTERPART_YIELD", 1.0)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("SPREAD_TREND_WINDOW", self.spread.trend_window),
            ("VOL_WINDOW", self.volatility.window),
            ("ATR_WINDOW", self.volatility.atr_window),
            ("VOL_LOOKBACK", self.volatility.lookback),
            ("RELATIVE_STRENGTH_WINDOW", self.divergence.window),
            ("CORRELATION_WINDOW", self.divergence.correlation_window),
            ("BETA_WINDOW", self.divergence.beta_window),
            ("RETREAT_WINDOW", self.divergence.retreat_window),
            ("CORRELATION_MATRIX_WINDOW", self.divergence.matrix_window),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            bail!("{} must be greater than 0", name);
        }

        let s = &self.spread;
        if !(s.critical < s.danger && s.danger < s.warning) {
            bail!(
                "Spread thresholds must satisfy critical < danger < warning (got {} / {} / {})",
                s.critical,
                s.danger,
                s.warning
            );
        }

        let v = &self.volatility;
        if v.percentile_high >= v.percentile_extreme {
            bail!(
                "VOL_PERCENTILE_HIGH ({}) must be below VOL_PERCENTILE_EXTREME ({})",
                v.percentile_high,
                v.percentile_extreme
            );
        }

        if self.divergence.threshold >= 0.0 {
            bail!(
                "DIVERGENCE_THRESHOLD must be a negative fraction (got {})",
                self.divergence.threshold
            );
        }

        Ok(())
    }
}
