use analysis_core::{ensure_window, stats, AnalysisError, Bar, DerivedSeries, PriceSeries};
use statrs::statistics::Statistics;

/// Trading sessions per year used for annualisation.
pub const TRADING_DAYS: f64 = 252.0;

/// Log returns of consecutive closes; undefined at index 0 and wherever a
/// close is non-positive.
pub fn log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(None);

    for w in closes.windows(2) {
        let r = if w[0] > 0.0 && w[1] > 0.0 {
            Some((w[1] / w[0]).ln())
        } else {
            None
        };
        returns.push(r);
    }
    returns
}

/// Annualized historical volatility (%): rolling sample std-dev of log
/// returns over `window` observations, scaled by sqrt(252) * 100.
///
/// Needs `window + 1` prices for its first value, so the first `window`
/// points are undefined.
pub fn historical_volatility(
    prices: &PriceSeries,
    window: usize,
) -> Result<DerivedSeries, AnalysisError> {
    ensure_window("volatility window", window)?;

    let returns = log_returns(&prices.closes());
    let mut values = vec![None; returns.len()];

    for i in window..returns.len() {
        let slice: Option<Vec<f64>> = returns[i + 1 - window..=i].iter().copied().collect();
        values[i] = slice
            .filter(|s| s.len() >= 2)
            .map(|s| s.std_dev() * TRADING_DAYS.sqrt() * 100.0);
    }

    Ok(DerivedSeries::from_parts(&prices.dates(), values))
}

/// True range per bar. The first bar has no previous close, so its range is
/// just high - low. Missing high/low fall back to the close.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let high_low = bar.high_or_close() - bar.low_or_close();
        let tr = if i == 0 {
            high_low
        } else {
            let prev_close = bars[i - 1].close;
            let high_close = (bar.high_or_close() - prev_close).abs();
            let low_close = (bar.low_or_close() - prev_close).abs();
            high_low.max(high_close).max(low_close)
        };
        ranges.push(tr);
    }
    ranges
}

/// Average True Range as a simple rolling mean of the true range.
pub fn average_true_range(
    prices: &PriceSeries,
    window: usize,
) -> Result<DerivedSeries, AnalysisError> {
    ensure_window("ATR window", window)?;

    let ranges = true_range(prices.bars());
    let mut values = vec![None; ranges.len()];

    for i in window.saturating_sub(1)..ranges.len() {
        values[i] = Some(stats::mean(&ranges[i + 1 - window..=i]));
    }

    Ok(DerivedSeries::from_parts(&prices.dates(), values))
}

/// ATR relative to the close, in percent.
pub fn atr_percent(prices: &PriceSeries, window: usize) -> Result<DerivedSeries, AnalysisError> {
    let atr = average_true_range(prices, window)?;

    let values = atr
        .values()
        .into_iter()
        .zip(prices.bars())
        .map(|(atr, bar)| atr.filter(|_| bar.close != 0.0).map(|a| a / bar.close * 100.0))
        .collect();

    Ok(DerivedSeries::from_parts(&prices.dates(), values))
}

/// Bar-to-bar simple change of the close, in percent.
pub fn daily_change(prices: &PriceSeries) -> DerivedSeries {
    let values = stats::pct_change(&prices.closes(), 1)
        .into_iter()
        .map(|c| c.map(|v| v * 100.0))
        .collect();
    DerivedSeries::from_parts(&prices.dates(), values)
}

/// Rank of the latest volatility reading within the trailing `lookback`
/// points (fewer if the series is shorter): share strictly below, 0-100.
/// Returns 50.0 when there is nothing to rank.
pub fn percentile_rank(volatility: &DerivedSeries, lookback: usize) -> Result<f64, AnalysisError> {
    ensure_window("percentile lookback", lookback)?;

    let recent: Vec<f64> = volatility
        .tail(lookback)
        .iter()
        .filter_map(|p| p.value)
        .collect();

    match recent.last() {
        Some(&current) => Ok(stats::percent_below(current, &recent)),
        None => Ok(50.0),
    }
}

/// High-low range of the last 5 bars relative to the low, in percent.
pub fn weekly_range(prices: &PriceSeries) -> f64 {
    if prices.len() < 5 {
        return 0.0;
    }

    let recent = prices.tail(5);
    let high = recent
        .iter()
        .map(Bar::high_or_close)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = recent
        .iter()
        .map(Bar::low_or_close)
        .fold(f64::INFINITY, f64::min);

    if low == 0.0 {
        return 0.0;
    }
    (high - low) / low * 100.0
}
