//! Risk Aggregation Module
//!
//! Folds the spread, volatility and divergence readings into one additive
//! risk score with narrative factors, and ranks alerts across categories.

pub mod board;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use board::{active_alerts, highest_priority};
pub use scoring::{RiskAggregator, RiskScore, ScoreBand, ScoringBands};
