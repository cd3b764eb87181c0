use std::path::Path;

use analysis_core::{FeatureTable, ResultRow};
use anyhow::{Context, Result};
use market_regime_detector::{build_training_set, SurrogateSample};

/// Write the strategy trace with its recognized column names.
pub fn write_results(path: &Path, results: &[ResultRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in results {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write features paired with the regime they produced. Returns the sample count.
pub fn write_training_set(
    path: &Path,
    features: &FeatureTable,
    results: &[ResultRow],
) -> Result<usize> {
    let samples = build_training_set(features, results);

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["Date".to_string()];
    header.extend(SurrogateSample::feature_names().iter().map(|s| s.to_string()));
    header.push("Regime".to_string());
    writer.write_record(&header)?;

    for sample in &samples {
        let mut record = vec![sample.date.to_string()];
        record.extend(sample.values().iter().map(|v| v.to_string()));
        record.push(sample.regime.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{FeatureRow, Regime};
    use chrono::{Duration, NaiveDate};

    fn fixtures() -> (FeatureTable, Vec<ResultRow>) {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let rows: Vec<FeatureRow> = (0..3)
            .map(|i| FeatureRow {
                date: start + Duration::days(i),
                price: 100.0,
                returns: 0.0,
                log_returns: 0.0,
                volatility: 0.1,
                sma_50: 99.0,
                sma_200: 98.0,
                momentum_3m: 0.02,
                drawdown: 0.0,
                trend: 1,
            })
            .collect();
        let results = rows[1..]
            .iter()
            .map(|r| ResultRow {
                date: r.date,
                value: 10_000.0,
                regime: Regime::HighVolatility,
                equity_weight: 0.1,
                bonds_weight: 0.4,
                cash_weight: 0.5,
            })
            .collect();
        (FeatureTable::new("TEST", rows), results)
    }

    #[test]
    fn test_exports_write_headers_and_rows() {
        let (features, results) = fixtures();
        let dir = std::env::temp_dir().join(format!("runner-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let trace = dir.join("trace.csv");
        write_results(&trace, &results).unwrap();
        let text = std::fs::read_to_string(&trace).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Value,Regime,Equity_Weight,Bonds_Weight,Cash_Weight")
        );
        assert_eq!(lines.next(), Some("2022-01-04,10000.0,High Volatility,0.1,0.4,0.5"));

        let labels = dir.join("labels.csv");
        assert_eq!(write_training_set(&labels, &features, &results).unwrap(), 2);
        let text = std::fs::read_to_string(&labels).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Date,Returns,Log_Returns,Volatility"));
        assert!(header.ends_with("Trend,Regime"));
        assert!(text.lines().nth(1).unwrap().starts_with("2022-01-03,"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
