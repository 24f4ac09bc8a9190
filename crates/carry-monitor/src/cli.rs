//! Command-line arguments for the `carry-monitor` binary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use analysis_core::{HistoryPeriod, PriceSeries};
use anyhow::{bail, Context, Result};
use spread_analysis::CounterpartYield;

use crate::loader::load_prices;
use crate::monitor::MonitorInputs;

pub const USAGE: &str = "\
Usage:
  carry-monitor --us-yield PATH --fx PATH --benchmark PATH [options]

Options:
  --counterpart PATH         Counterpart yield history (CSV)
  --counterpart-yield X      Fixed counterpart yield in percent
  --high-beta NAME=PATH      High-beta asset checked for divergence (repeatable)
  --asset NAME=PATH          Extra asset for the retreat ranking (repeatable)
  --period P                 Keep only the last 1mo, 3mo, 6mo, 1y or 2y of each file

Without a counterpart, COUNTERPART_YIELD (default 1.0) is used.";

#[derive(Debug, Clone, PartialEq)]
pub enum CounterpartSource {
    File(PathBuf),
    Fixed(f64),
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorArgs {
    pub us_yield: PathBuf,
    pub counterpart: CounterpartSource,
    pub fx: PathBuf,
    pub benchmark: PathBuf,
    pub high_beta: Vec<(String, PathBuf)>,
    pub assets: Vec<(String, PathBuf)>,
    pub period: Option<HistoryPeriod>,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn required(args: &[String], flag: &str) -> Result<PathBuf> {
    flag_value(args, flag)
        .map(PathBuf::from)
        .with_context(|| format!("{} is required\n\n{}", flag, USAGE))
}

/// Every `NAME=PATH` value following `flag`.
fn named_paths(args: &[String], flag: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for pair in args.windows(2).filter(|w| w[0] == flag) {
        let Some((name, path)) = pair[1].split_once('=') else {
            bail!("{} expects NAME=PATH, got {:?}", flag, pair[1]);
        };
        if name.is_empty() || path.is_empty() {
            bail!("{} expects NAME=PATH, got {:?}", flag, pair[1]);
        }
        entries.push((name.to_string(), PathBuf::from(path)));
    }
    Ok(entries)
}

impl MonitorArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let counterpart = match (
            flag_value(args, "--counterpart"),
            flag_value(args, "--counterpart-yield"),
        ) {
            (Some(_), Some(_)) => {
                bail!("--counterpart and --counterpart-yield are mutually exclusive")
            }
            (Some(path), None) => CounterpartSource::File(PathBuf::from(path)),
            (None, Some(raw)) => CounterpartSource::Fixed(
                raw.parse::<f64>()
                    .with_context(|| format!("--counterpart-yield: invalid number {:?}", raw))?,
            ),
            (None, None) => CounterpartSource::Fallback,
        };

        Ok(Self {
            us_yield: required(args, "--us-yield")?,
            counterpart,
            fx: required(args, "--fx")?,
            benchmark: required(args, "--benchmark")?,
            high_beta: named_paths(args, "--high-beta")?,
            assets: named_paths(args, "--asset")?,
            period: flag_value(args, "--period")
                .map(str::parse::<HistoryPeriod>)
                .transpose()
                .context("--period")?,
        })
    }

    pub fn load(&self, fallback_yield: f64) -> Result<MonitorInputs> {
        let load = |symbol: &str, path: &PathBuf| -> Result<PriceSeries> {
            let series = load_prices(symbol, path)?;
            Ok(match self.period {
                Some(period) => series.recent(period),
                None => series,
            })
        };

        let counterpart = match &self.counterpart {
            CounterpartSource::File(path) => CounterpartYield::Series(load("COUNTERPART", path)?),
            CounterpartSource::Fixed(value) => CounterpartYield::Fixed(*value),
            CounterpartSource::Fallback => CounterpartYield::Fixed(fallback_yield),
        };

        Ok(MonitorInputs {
            us_yield: load("US_YIELD", &self.us_yield)?,
            counterpart,
            fx: load("FX", &self.fx)?,
            benchmark: load("BENCHMARK", &self.benchmark)?,
            high_beta: load_basket(&self.high_beta, load)?,
            retreat_extras: load_basket(&self.assets, load)?,
        })
    }
}

fn load_basket<F>(entries: &[(String, PathBuf)], load: F) -> Result<BTreeMap<String, PriceSeries>>
where
    F: Fn(&str, &PathBuf) -> Result<PriceSeries>,
{
    entries
        .iter()
        .map(|(name, path)| Ok::<_, anyhow::Error>((name.clone(), load(name, path)?)))
        .collect()
}
