//! Carry Monitor
//!
//! Runs one pass of the spread, volatility and divergence analyzers over
//! already-loaded price series and folds the results into a risk report.

pub mod cli;
pub mod config;
pub mod loader;
pub mod monitor;

pub use config::MonitorConfig;
pub use monitor::{
    CarryMonitor, MonitorInputs, MonitorReport, SpreadReport, VolatilityReport,
};
