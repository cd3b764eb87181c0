#[cfg(test)]
mod tests {
    use super::super::engine::*;
    use super::super::indicators::*;
    use analysis_core::{AnalysisError, PricePoint, PriceSeries};
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn series_from(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(start + Duration::days(i as i64), p))
            .collect();
        PriceSeries::new("TEST", points).unwrap()
    }

    /// Gently oscillating uptrend, long enough for every window.
    fn wavy_prices(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 100.0 * (1.0005f64).powi(i as i32) * (1.0 + 0.02 * (i as f64 / 7.0).sin()))
            .collect()
    }

    #[test]
    fn test_rolling_mean_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&data, 3);

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_abs_diff_eq!(result[2].unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result[3].unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result[4].unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_mean_insufficient_data() {
        let result = rolling_mean(&[1.0, 2.0], 5);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_pct_change() {
        let result = pct_change(&[100.0, 110.0, 99.0], 1);
        assert_eq!(result[0], None);
        assert_abs_diff_eq!(result[1].unwrap(), 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(result[2].unwrap(), -0.10, epsilon = 1e-12);

        let two_period = pct_change(&[100.0, 110.0, 120.0], 2);
        assert_abs_diff_eq!(two_period[2].unwrap(), 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_log_returns() {
        let result = log_returns(&[100.0, 110.0]);
        assert_eq!(result[0], None);
        assert_abs_diff_eq!(result[1].unwrap(), (1.1f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let data = vec![None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let result = rolling_std(&data, 3);

        // Window touching the leading gap stays undefined.
        assert_eq!(result[2], None);
        // sample std of [1, 2, 3] = 1
        assert_abs_diff_eq!(result[3].unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result[4].unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_max_min_periods() {
        let result = rolling_max(&[3.0, 1.0, 4.0, 2.0, 1.0], 3, 1);
        let expected = [3.0, 3.0, 4.0, 4.0, 4.0];
        for (got, want) in result.iter().zip(expected) {
            assert_eq!(got.unwrap(), want);
        }
        // Window of 3 drops the 4.0 once it slides past.
        let slid = rolling_max(&[4.0, 1.0, 1.0, 2.0], 3, 1);
        assert_eq!(slid[3], Some(2.0));
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let empty = PriceSeries::new("TEST", vec![]).unwrap();
        let err = FeatureEngine::default().compute(&empty).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_short_series_yields_empty_table() {
        let series = series_from(&wavy_prices(199));
        let table = FeatureEngine::default().compute(&series).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_first_row_is_two_hundredth_price() {
        let prices = wavy_prices(300);
        let series = series_from(&prices);
        let table = FeatureEngine::default().compute(&series).unwrap();

        assert_eq!(table.len(), 300 - (LONG_SMA_WINDOW - 1));
        let first = table.get(0).unwrap();
        assert_eq!(first.date, series.points()[LONG_SMA_WINDOW - 1].date);
        assert_eq!(first.price, prices[LONG_SMA_WINDOW - 1]);

        let expected_sma: f64 = prices[..LONG_SMA_WINDOW].iter().sum::<f64>() / 200.0;
        assert_abs_diff_eq!(first.sma_200, expected_sma, epsilon = 1e-9);
    }

    #[test]
    fn test_feature_columns_are_consistent() {
        let prices = wavy_prices(400);
        let table = FeatureEngine::default().compute(&series_from(&prices)).unwrap();

        for row in table.rows() {
            assert!(row.drawdown <= 0.0);
            assert!(row.volatility >= 0.0);
            assert_eq!(row.is_uptrend(), row.price > row.sma_200);
            assert_abs_diff_eq!(row.log_returns, (1.0 + row.returns).ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let prices: Vec<f64> = (0..260).map(|i| 50.0 * (1.001f64).powi(i)).collect();
        let table = FeatureEngine::default().compute(&series_from(&prices)).unwrap();

        let last = table.last().unwrap();
        assert_abs_diff_eq!(last.volatility, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last.drawdown, 0.0, epsilon = 1e-12);
        assert_eq!(last.trend, 1);
        assert_abs_diff_eq!(last.momentum_3m, (1.001f64).powi(63) - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_volatility_is_annualized() {
        // Alternating +1% / -1% moves.
        let mut prices = vec![100.0];
        for i in 1..230 {
            let step = if i % 2 == 0 { 1.01 } else { 0.99 };
            prices.push(prices[i - 1] * step);
        }
        let table = FeatureEngine::default().compute(&series_from(&prices)).unwrap();
        let row = table.last().unwrap();

        let logs: Vec<f64> = (prices.len() - VOLATILITY_WINDOW..prices.len())
            .map(|i| (prices[i] / prices[i - 1]).ln())
            .collect();
        let mean = logs.iter().sum::<f64>() / logs.len() as f64;
        let var = logs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (logs.len() - 1) as f64;
        assert_abs_diff_eq!(row.volatility, var.sqrt() * 252f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_drawdown_uses_trailing_year_peak() {
        // Spike early on, then flat: once the spike leaves the 252-day
        // window the drawdown returns to zero.
        let mut prices = vec![100.0; 600];
        prices[10] = 200.0;
        let table = FeatureEngine::default().compute(&series_from(&prices)).unwrap();

        let inside = table.get(0).unwrap();
        assert_abs_diff_eq!(inside.drawdown, -0.5, epsilon = 1e-12);
        let outside = table.last().unwrap();
        assert_abs_diff_eq!(outside.drawdown, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_future_prices_do_not_change_past_rows() {
        let prices = wavy_prices(320);
        let mut shocked = prices.clone();
        shocked[300] *= 0.5;

        let engine = FeatureEngine::default();
        let base = engine.compute(&series_from(&prices)).unwrap();
        let alt = engine.compute(&series_from(&shocked)).unwrap();

        let cutoff = 300 - (LONG_SMA_WINDOW - 1);
        assert_eq!(base.rows()[..cutoff], alt.rows()[..cutoff]);
        assert_ne!(base.rows()[cutoff], alt.rows()[cutoff]);
    }
}
