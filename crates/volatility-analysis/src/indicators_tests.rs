#[cfg(test)]
mod tests {
    use super::super::analyzer::*;
    use super::super::indicators::*;
    use analysis_core::{AlertLevel, AnalysisError, Bar, DerivedSeries, PriceSeries};
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    // Small alternating moves of +/-0.1%
    fn calm_closes(n: usize) -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 1..n {
            let prev = closes[i - 1];
            closes.push(if i % 2 == 0 { prev * 0.999 } else { prev * 1.001 });
        }
        closes
    }

    // 15 bars, constant 3-point range, close rising by 1 each day
    fn sample_bars() -> PriceSeries {
        let bars = (0..15)
            .map(|i| {
                let base = 100.0 + i as f64;
                Bar::new(
                    start() + chrono::Days::new(i as u64),
                    base,
                    base + 2.0,
                    base - 1.0,
                    base + 1.0,
                )
            })
            .collect();
        PriceSeries::new("USDJPY", bars).unwrap()
    }

    fn derived(values: &[f64]) -> DerivedSeries {
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| start() + chrono::Days::new(i as u64))
            .collect();
        DerivedSeries::from_parts(&dates, values.iter().map(|&v| Some(v)).collect())
    }

    #[test]
    fn test_historical_volatility_undefined_for_first_window() {
        let prices = PriceSeries::from_closes("FX", start(), &calm_closes(21)).unwrap();
        let hv = historical_volatility(&prices, 20).unwrap();

        assert_eq!(hv.len(), 21);
        assert!(hv.points[..20].iter().all(|p| p.value.is_none()));
        assert!(hv.points[20].value.is_some());
    }

    #[test]
    fn test_historical_volatility_non_negative() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 150.0 + (i as f64 * 0.7).sin() * 3.0)
            .collect();
        let prices = PriceSeries::from_closes("FX", start(), &closes).unwrap();
        let hv = historical_volatility(&prices, 20).unwrap();

        let defined = hv.defined();
        assert_eq!(defined.len(), 40);
        assert!(defined.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_historical_volatility_flat_prices_is_zero() {
        let prices = PriceSeries::from_closes("FX", start(), &[100.0; 30]).unwrap();
        let hv = historical_volatility(&prices, 20).unwrap();
        assert!(hv.latest().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_zero_window_rejected() {
        let prices = PriceSeries::from_closes("FX", start(), &calm_closes(30)).unwrap();
        assert!(matches!(
            historical_volatility(&prices, 0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(average_true_range(&prices, 0).is_err());
        assert!(percentile_rank(&DerivedSeries::default(), 0).is_err());
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let prices = sample_bars();
        let tr = true_range(prices.bars());

        assert_eq!(tr.len(), 15);
        // every bar has high - low = 3, which dominates the gap to the prior close
        assert!(tr.iter().all(|v| (v - 3.0).abs() < 1e-12));

        let gap = vec![
            Bar::new(start(), 100.0, 101.0, 99.0, 100.0),
            Bar::new(start() + chrono::Days::new(1), 105.0, 106.0, 104.0, 105.0),
        ];
        let tr = true_range(&gap);
        assert!((tr[0] - 2.0).abs() < 1e-12);
        assert!((tr[1] - 6.0).abs() < 1e-12); // |106 - 100|
    }

    #[test]
    fn test_atr_and_atr_percent() {
        let prices = sample_bars();
        let atr = average_true_range(&prices, 14).unwrap();

        assert!(atr.points[..13].iter().all(|p| p.value.is_none()));
        assert!((atr.points[13].value.unwrap() - 3.0).abs() < 1e-12);
        assert!((atr.latest().unwrap() - 3.0).abs() < 1e-12);

        let pct = atr_percent(&prices, 14).unwrap();
        assert!((pct.latest().unwrap() - 3.0 / 115.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_close_only_bars_fall_back_to_close() {
        let prices = PriceSeries::from_closes("US10Y", start(), &[4.0, 4.2, 4.1]).unwrap();
        let tr = true_range(prices.bars());
        assert_eq!(tr[0], 0.0);
        assert!((tr[1] - 0.2).abs() < 1e-12);
        assert!((tr[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_daily_change() {
        let prices = PriceSeries::from_closes("FX", start(), &[100.0, 102.0, 99.96]).unwrap();
        let changes = daily_change(&prices);

        assert!(changes.points[0].value.is_none());
        assert!((changes.points[1].value.unwrap() - 2.0).abs() < 1e-9);
        assert!((changes.points[2].value.unwrap() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_rank() {
        let series = derived(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((percentile_rank(&series, 252).unwrap() - 80.0).abs() < 1e-12);

        // only the trailing 2 points are ranked: 5.0 against [4.0, 5.0]
        assert!((percentile_rank(&series, 2).unwrap() - 50.0).abs() < 1e-12);

        let falling = derived(&[5.0, 4.0, 3.0]);
        assert_eq!(percentile_rank(&falling, 252).unwrap(), 0.0);
    }

    #[test]
    fn test_percentile_rank_without_data_is_neutral() {
        assert_eq!(percentile_rank(&DerivedSeries::default(), 252).unwrap(), 50.0);
    }

    #[test]
    fn test_weekly_range() {
        let prices =
            PriceSeries::from_closes("FX", start(), &[90.0, 100.0, 102.0, 98.0, 101.0, 104.0])
                .unwrap();
        let expected = (104.0 - 98.0) / 98.0 * 100.0;
        assert!((weekly_range(&prices) - expected).abs() < 1e-9);

        let short = PriceSeries::from_closes("FX", start(), &[100.0, 101.0]).unwrap();
        assert_eq!(weekly_range(&short), 0.0);
    }

    #[test]
    fn test_snapshot_of_empty_series_is_neutral() {
        let analyzer = VolatilityAnalyzer::default();
        let metrics = analyzer.snapshot(&PriceSeries::empty("FX")).unwrap();
        assert_eq!(metrics, VolatilityMetrics::default());
        assert_eq!(metrics.hv_percentile, 50.0);
    }

    #[test]
    fn test_snapshot_fields_in_range() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 150.0 + (i as f64 * 0.3).sin() * 4.0)
            .collect();
        let prices = PriceSeries::from_closes("FX", start(), &closes).unwrap();
        let metrics = VolatilityAnalyzer::default().snapshot(&prices).unwrap();

        assert!(metrics.historical_volatility >= 0.0);
        assert!(metrics.atr_percent >= 0.0);
        assert!((0.0..=100.0).contains(&metrics.hv_percentile));
        assert!(metrics.max_daily_change_5d >= metrics.daily_change.abs());
        assert!(metrics.weekly_range >= 0.0);
        assert!(metrics.hv_std >= 0.0);
    }

    #[test]
    fn test_classify_alert_levels() {
        let analyzer = VolatilityAnalyzer::default();

        assert_eq!(analyzer.classify_alert(0.5, 1.0, 40.0).level, AlertLevel::Safe);
        assert_eq!(analyzer.classify_alert(0.5, 1.0, 85.0).level, AlertLevel::Warning);
        assert_eq!(analyzer.classify_alert(-2.0, 1.0, 40.0).level, AlertLevel::Danger);
        assert_eq!(analyzer.classify_alert(0.5, 5.5, 40.0).level, AlertLevel::Danger);

        // percentile extreme outranks a large daily move
        let c = analyzer.classify_alert(3.0, 6.0, 97.0);
        assert_eq!(c.level, AlertLevel::Critical);
        assert_eq!(c.threshold, Some(95.0));
    }

    #[test]
    fn test_classify_alert_tie_keeps_first_condition() {
        let analyzer = VolatilityAnalyzer::default();
        let c = analyzer.classify_alert(-3.0, -6.0, 10.0);

        assert_eq!(c.level, AlertLevel::Danger);
        assert!(c.message.starts_with("Daily move"));
        assert_eq!(c.threshold, Some(2.0));
    }

    #[test]
    fn test_spiking_after_calm_period() {
        let mut closes = calm_closes(40);
        for i in 0..5 {
            let prev = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { prev * 1.03 } else { prev * 0.97 });
        }
        let prices = PriceSeries::from_closes("FX", start(), &closes).unwrap();
        assert!(VolatilityAnalyzer::default().is_spiking(&prices).unwrap());
    }

    #[test]
    fn test_calm_series_not_spiking() {
        let analyzer = VolatilityAnalyzer::default();

        let calm = PriceSeries::from_closes("FX", start(), &calm_closes(40)).unwrap();
        assert!(!analyzer.is_spiking(&calm).unwrap());

        // fewer than 20 defined volatility readings
        let short = PriceSeries::from_closes("FX", start(), &calm_closes(30)).unwrap();
        assert!(!analyzer.is_spiking(&short).unwrap());
    }
}
