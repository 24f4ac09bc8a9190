use analysis_core::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Second leg of the spread: a manual scalar broadcast to every date, or a
/// yield series matched date by date.
#[derive(Debug, Clone)]
pub enum CounterpartYield {
    Fixed(f64),
    Series(PriceSeries),
}

impl CounterpartYield {
    pub fn on(&self, date: NaiveDate) -> Option<f64> {
        match self {
            CounterpartYield::Fixed(value) => Some(*value),
            CounterpartYield::Series(series) => series.close_on(date),
        }
    }
}

impl From<f64> for CounterpartYield {
    fn from(value: f64) -> Self {
        CounterpartYield::Fixed(value)
    }
}

impl From<PriceSeries> for CounterpartYield {
    fn from(series: PriceSeries) -> Self {
        CounterpartYield::Series(series)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    pub date: NaiveDate,
    pub us_yield: f64,
    /// Missing when the counterpart series has no quote for this date
    pub counterpart_yield: Option<f64>,
    pub spread: Option<f64>,
}

/// Spread history aligned to the US yield dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeries {
    pub points: Vec<SpreadPoint>,
}

impl SpreadSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Defined spread values in date order; undefined dates are dropped.
    pub fn spreads(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.spread).collect()
    }

    pub fn current(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.spread)
    }
}

/// Summary of the defined spread observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadStatistics {
    pub current: f64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Share of observations strictly below `current` (0-100)
    pub percentile: f64,
    pub change_1d: f64,
    pub change_5d: f64,
    pub change_20d: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadTrend {
    Narrowing,
    Widening,
    Oscillating,
    InsufficientData,
    Unknown,
}

impl SpreadTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadTrend::Narrowing => "narrowing",
            SpreadTrend::Widening => "widening",
            SpreadTrend::Oscillating => "oscillating",
            SpreadTrend::InsufficientData => "insufficient_data",
            SpreadTrend::Unknown => "unknown",
        }
    }
}

/// Alert lines and trend parameters for the spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadConfig {
    /// Spread at or below this is critical (%)
    pub critical: f64,
    /// Spread at or below this is dangerous (%)
    pub danger: f64,
    /// Spread at or below this is a warning (%)
    pub warning: f64,
    pub trend_window: usize,
    /// Slope magnitude (%/day) under which the trend counts as oscillating
    pub trend_slope: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            critical: 1.5,
            danger: 2.0,
            warning: 2.5,
            trend_window: 20,
            trend_slope: 0.01,
        }
    }
}
