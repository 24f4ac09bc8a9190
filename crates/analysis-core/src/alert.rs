//! Alert primitives shared by every indicator category.
//!
//! Severity is a closed, totally ordered enum. Threshold classification is
//! expressed as ordered `Band` tables scanned top-down, first match wins, so
//! the tie-break policy is visible in the table itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Alert severity, ordered `Safe < Info < Warning < Danger < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Safe,
    Info,
    Warning,
    Danger,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "safe",
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
            AlertLevel::Critical => "critical",
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != AlertLevel::Safe
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator family an alert belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Spread,
    Volatility,
    Divergence,
    System,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Spread => "spread",
            AlertCategory::Volatility => "volatility",
            AlertCategory::Divergence => "divergence",
            AlertCategory::System => "system",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub category: AlertCategory,
    pub message: String,
    pub value: f64,
    pub threshold: Option<f64>,
}

impl Alert {
    pub fn all_clear() -> Self {
        Self {
            level: AlertLevel::Safe,
            category: AlertCategory::System,
            message: "All clear".to_string(),
            value: 0.0,
            threshold: None,
        }
    }
}

/// Outcome of classifying one indicator reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub level: AlertLevel,
    pub message: String,
    /// Reading that decided the level.
    pub value: f64,
    /// Threshold that was crossed, if any.
    pub threshold: Option<f64>,
}

impl Classification {
    pub fn into_alert(self, category: AlertCategory) -> Alert {
        Alert {
            level: self.level,
            category,
            message: self.message,
            value: self.value,
            threshold: self.threshold,
        }
    }
}

/// Predicate half of a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    /// value <= bound
    AtMost(f64),
    /// value >= bound
    AtLeast(f64),
    /// value < bound
    Below(f64),
    /// value > bound
    Above(f64),
    Always,
}

impl Bound {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Bound::AtMost(b) => value <= b,
            Bound::AtLeast(b) => value >= b,
            Bound::Below(b) => value < b,
            Bound::Above(b) => value > b,
            Bound::Always => true,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        match *self {
            Bound::AtMost(b) | Bound::AtLeast(b) | Bound::Below(b) | Bound::Above(b) => Some(b),
            Bound::Always => None,
        }
    }
}

/// One `(predicate, outcome)` row of a classification table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    pub bound: Bound,
    pub outcome: T,
}

impl<T> Band<T> {
    pub fn new(bound: Bound, outcome: T) -> Self {
        Self { bound, outcome }
    }
}

/// Scan `bands` in order and return the first one whose predicate holds.
pub fn first_match<T>(value: f64, bands: &[Band<T>]) -> Option<&Band<T>> {
    bands.iter().find(|band| band.bound.matches(value))
}

/// Most severe item; among equally severe items the earliest wins.
pub fn most_severe<T, F>(items: impl IntoIterator<Item = T>, level_of: F) -> Option<T>
where
    F: Fn(&T) -> AlertLevel,
{
    items.into_iter().fold(None, |best, item| match best {
        Some(current) if level_of(&current) >= level_of(&item) => Some(current),
        _ => Some(item),
    })
}
