//! Cross-Asset Divergence Module
//!
//! Compares a basket of high-beta assets against a benchmark: relative
//! strength, rolling correlation and beta, divergence detection, and the
//! beta-ordered "liquidity retreat" pattern where risk assets are sold first.

pub mod analyzer;
pub mod models;
pub mod relative;


pub use analyzer::{classify_retreat, DivergenceAnalyzer};
pub use models::{
    AssetBeta, CorrelationMatrix, DivergenceConfig, DivergenceDetail, DivergenceResult,
    RetreatAnalysis, RetreatSeverity,
};
pub use relative::*;
