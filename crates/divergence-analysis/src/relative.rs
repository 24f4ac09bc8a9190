//! Pairwise measures between an asset and its benchmark, all computed on
//! the dates both series share.

use std::collections::{BTreeMap, BTreeSet};

use analysis_core::{ensure_window, stats, AnalysisError, DerivedSeries, PriceSeries};
use chrono::NaiveDate;
use tracing::debug;

use crate::models::CorrelationMatrix;

/// Closes of two series on their common dates, in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub asset: Vec<f64>,
    pub benchmark: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Intersect two date-sorted series.
pub fn align(asset: &PriceSeries, benchmark: &PriceSeries) -> AlignedPair {
    let a = asset.bars();
    let b = benchmark.bars();
    let mut pair = AlignedPair::default();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                pair.dates.push(a[i].date);
                pair.asset.push(a[i].close);
                pair.benchmark.push(b[j].close);
                i += 1;
                j += 1;
            }
        }
    }
    pair
}

/// Day-over-day simple returns, dropping the undefined first entry.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| stats::simple_return(w[0], w[1]).unwrap_or(0.0))
        .collect()
}

/// Return over the trailing `window` bars in percent:
/// `close[last] / close[last - window] - 1`. 0 without enough history.
pub fn window_return(closes: &[f64], window: usize) -> f64 {
    if window == 0 || closes.len() <= window {
        return 0.0;
    }
    let last = closes.len() - 1;
    stats::simple_return(closes[last - window], closes[last])
        .map(|r| r * 100.0)
        .unwrap_or(0.0)
}

/// `(asset return - benchmark return) * 100` over `window` bars, per
/// aligned date. Empty when either input is empty or the dates never meet.
pub fn relative_strength(
    asset: &PriceSeries,
    benchmark: &PriceSeries,
    window: usize,
) -> Result<DerivedSeries, AnalysisError> {
    ensure_window("relative strength window", window)?;

    let pair = align(asset, benchmark);
    let asset_returns = stats::pct_change(&pair.asset, window);
    let bench_returns = stats::pct_change(&pair.benchmark, window);

    let values = asset_returns
        .into_iter()
        .zip(bench_returns)
        .map(|(a, b)| Some((a? - b?) * 100.0))
        .collect();

    Ok(DerivedSeries::from_parts(&pair.dates, values))
}

/// Pearson correlation of daily returns over a trailing `window`.
/// First defined at index `window` of the aligned dates.
pub fn rolling_correlation(
    asset: &PriceSeries,
    benchmark: &PriceSeries,
    window: usize,
) -> Result<DerivedSeries, AnalysisError> {
    ensure_window("correlation window", window)?;

    let pair = align(asset, benchmark);
    let asset_returns = daily_returns(&pair.asset);
    let bench_returns = daily_returns(&pair.benchmark);
    let mut values = vec![None; pair.len()];

    // returns[k] is the move into date k + 1
    for end in window..=asset_returns.len() {
        values[end] = stats::pearson(
            &asset_returns[end - window..end],
            &bench_returns[end - window..end],
        );
    }

    Ok(DerivedSeries::from_parts(&pair.dates, values))
}

/// `Cov(asset, benchmark) / Var(benchmark)` of daily returns over the
/// trailing `window` aligned bars.
///
/// Falls back to 1.0 (moves with the market) with fewer than
/// `min_observations` aligned bars or a benchmark without variance.
pub fn beta(
    asset: &PriceSeries,
    benchmark: &PriceSeries,
    window: usize,
    min_observations: usize,
) -> Result<f64, AnalysisError> {
    ensure_window("beta window", window)?;

    let pair = align(asset, benchmark);
    let start = pair.len().saturating_sub(window);
    let (asset_closes, bench_closes) = (&pair.asset[start..], &pair.benchmark[start..]);

    if asset_closes.len() < min_observations.max(2) {
        debug!(
            "{}: {} aligned bars for beta, defaulting to 1.0",
            asset.symbol(),
            asset_closes.len()
        );
        return Ok(1.0);
    }

    let a = &daily_returns(asset_closes);
    let b = &daily_returns(bench_closes);
    let a_mean = stats::mean(a);
    let b_mean = stats::mean(b);

    let mut covariance = 0.0;
    let mut bench_variance = 0.0;
    for (x, y) in a.iter().zip(b) {
        covariance += (x - a_mean) * (y - b_mean);
        bench_variance += (y - b_mean).powi(2);
    }

    if bench_variance == 0.0 {
        debug!("{}: benchmark has no variance, beta defaulting to 1.0", asset.symbol());
        return Ok(1.0);
    }

    Ok(covariance / bench_variance)
}

/// Minimum aligned returns for a correlation matrix.
const MATRIX_MIN_RETURNS: usize = 10;

/// Pairwise correlation of daily returns over the last `window` returns on
/// the dates shared by every non-empty asset.
pub fn correlation_matrix(
    assets: &BTreeMap<String, PriceSeries>,
    window: usize,
) -> Result<Option<CorrelationMatrix>, AnalysisError> {
    ensure_window("correlation matrix window", window)?;

    let present: Vec<(&String, &PriceSeries)> =
        assets.iter().filter(|(_, s)| !s.is_empty()).collect();
    if present.len() < 2 {
        return Ok(None);
    }

    let mut common: BTreeSet<NaiveDate> = present[0].1.dates().into_iter().collect();
    for (_, series) in &present[1..] {
        let dates: BTreeSet<NaiveDate> = series.dates().into_iter().collect();
        common = common.intersection(&dates).copied().collect();
    }

    let returns: Vec<Vec<f64>> = present
        .iter()
        .map(|(_, series)| {
            let closes: Vec<f64> = common
                .iter()
                .filter_map(|&date| series.close_on(date))
                .collect();
            let r = daily_returns(&closes);
            r[r.len().saturating_sub(window)..].to_vec()
        })
        .collect();

    if returns[0].len() < MATRIX_MIN_RETURNS {
        debug!("{} common returns, correlation matrix skipped", returns[0].len());
        return Ok(None);
    }

    let n = present.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let rho = stats::pearson(&returns[i], &returns[j]).unwrap_or(0.0);
            values[i][j] = rho;
            values[j][i] = rho;
        }
    }

    Ok(Some(CorrelationMatrix {
        assets: present.iter().map(|(id, _)| (*id).clone()).collect(),
        values,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::Bar;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(symbol, start(), closes).unwrap()
    }

    #[test]
    fn test_align_keeps_common_dates_only() {
        let a = series("A", &[1.0, 2.0, 3.0, 4.0]);
        let b = PriceSeries::new(
            "B",
            vec![
                Bar::close_only(start() + chrono::Days::new(1), 20.0),
                Bar::close_only(start() + chrono::Days::new(3), 40.0),
                Bar::close_only(start() + chrono::Days::new(7), 80.0),
            ],
        )
        .unwrap();

        let pair = align(&a, &b);
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.asset, vec![2.0, 4.0]);
        assert_eq!(pair.benchmark, vec![20.0, 40.0]);
    }

    #[test]
    fn test_window_return() {
        assert!((window_return(&[100.0, 105.0, 110.0], 2) - 10.0).abs() < 1e-9);
        assert_eq!(window_return(&[100.0, 110.0], 2), 0.0);
        assert_eq!(window_return(&[], 5), 0.0);
    }

    #[test]
    fn test_relative_strength_values() {
        let asset = series("A", &[100.0, 110.0, 121.0]);
        let bench = series("B", &[100.0, 100.0, 100.0]);
        let rs = relative_strength(&asset, &bench, 1).unwrap();

        assert!(rs.points[0].value.is_none());
        assert!((rs.points[1].value.unwrap() - 10.0).abs() < 1e-9);
        assert!((rs.points[2].value.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_relative_strength_empty_inputs() {
        let bench = series("B", &[100.0, 101.0]);
        let rs = relative_strength(&PriceSeries::empty("A"), &bench, 1).unwrap();
        assert!(rs.is_empty());
        assert!(relative_strength(&bench, &bench, 0).is_err());
    }

    #[test]
    fn test_rolling_correlation_of_proportional_moves() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.9).sin() * 5.0).collect();
        let doubled: Vec<f64> = closes.iter().map(|c| c * 2.0).collect();
        let corr = rolling_correlation(&series("A", &doubled), &series("B", &closes), 10).unwrap();

        assert!(corr.points[..10].iter().all(|p| p.value.is_none()));
        assert!((corr.latest().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_beta_falls_back_to_one() {
        let short = series("A", &[1.0, 2.0, 3.0]);
        assert_eq!(beta(&short, &short, 60, 20).unwrap(), 1.0);

        let flat = series("B", &[50.0; 40]);
        let moving: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert_eq!(beta(&series("A", &moving), &flat, 60, 20).unwrap(), 1.0);
    }

    /// Closes compounding `returns` from 100.
    fn compound(returns: &[f64]) -> Vec<f64> {
        let mut closes = vec![100.0];
        for r in returns {
            let last = closes[closes.len() - 1];
            closes.push(last * (1.0 + r));
        }
        closes
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 0.01 * (i as f64 * 1.3).sin()).collect()
    }

    #[test]
    fn test_beta_computed_at_minimum_bars() {
        // 20 bars, 19 returns: enough for the 20-observation minimum
        let bench_returns = wave(19);
        let asset_returns: Vec<f64> = bench_returns.iter().map(|r| r * 2.0).collect();
        let bench = series("B", &compound(&bench_returns));
        let asset = series("A", &compound(&asset_returns));

        let b = beta(&asset, &bench, 60, 20).unwrap();
        assert!((b - 2.0).abs() < 1e-9, "beta = {}", b);

        let short = series("A", &compound(&asset_returns[..18]));
        assert_eq!(beta(&short, &bench, 60, 20).unwrap(), 1.0);
    }

    #[test]
    fn test_beta_uses_trailing_window_bars() {
        // 61 bars; the oldest return moves against the benchmark and falls
        // outside a 60-bar window
        let mut bench_returns = vec![0.05];
        bench_returns.extend(wave(59));
        let mut asset_returns = vec![-0.05];
        asset_returns.extend(bench_returns[1..].iter().map(|r| r * 2.0));
        let bench = series("B", &compound(&bench_returns));
        let asset = series("A", &compound(&asset_returns));
        assert_eq!(bench.len(), 61);

        let b = beta(&asset, &bench, 60, 20).unwrap();
        assert!((b - 2.0).abs() < 1e-9, "beta = {}", b);

        let wider = beta(&asset, &bench, 61, 20).unwrap();
        assert!((wider - 2.0).abs() > 0.1);
    }

    #[test]
    fn test_correlation_matrix_needs_enough_returns() {
        let mut assets = BTreeMap::new();
        assets.insert("A".to_string(), series("A", &[1.0, 2.0, 3.0]));
        assets.insert("B".to_string(), series("B", &[3.0, 2.0, 1.0]));
        assert!(correlation_matrix(&assets, 60).unwrap().is_none());

        let mut single = BTreeMap::new();
        single.insert("A".to_string(), series("A", &[1.0; 30]));
        assert!(correlation_matrix(&single, 60).unwrap().is_none());
    }
}
