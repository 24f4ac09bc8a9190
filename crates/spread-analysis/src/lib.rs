//! Yield Spread Module
//!
//! Derives the US-minus-counterpart sovereign yield spread, its summary
//! statistics and trend, and classifies the current level against the
//! configured alert lines. A narrowing spread is the core carry-trade risk.

pub mod analyzer;
pub mod models;

pub use analyzer::SpreadAnalyzer;
pub use models::{
    CounterpartYield, SpreadConfig, SpreadPoint, SpreadSeries, SpreadStatistics, SpreadTrend,
};
