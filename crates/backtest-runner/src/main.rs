//! backtest-runner: run the regime-adaptive strategy against its benchmark
//! on a CSV price history and print the JSON report.
//!
//! Usage:
//!   cargo run -p backtest-runner -- --prices data/ --ticker SPY --start 2015-01-01 --end 2023-12-31
//!   cargo run -p backtest-runner -- --prices spy.csv --ticker SPY --start 2015-01-01 --end 2023-12-31 --shock 0.3
//!   cargo run -p backtest-runner -- --prices data/ --ticker SPY --start 2015-01-01 --end 2023-12-31 \
//!       --no-stress --results-csv trace.csv --training-set labels.csv --pretty
//!
//! Engine options come from `ECHO_*` environment variables (or `.env`).

mod export;
mod price_source;

use std::path::PathBuf;

use analysis_core::{EngineConfig, PriceSource};
use anyhow::{bail, Context, Result};
use backtest_engine::{
    build_report, crisis_reaction, run_stress_test, BacktestEngine, ShockPoint, StressScenario,
    TemplateExplainer,
};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::price_source::CsvPriceSource;

const USAGE: &str = "usage: backtest-runner --prices <file-or-dir> --ticker <SYMBOL> \
--start <YYYY-MM-DD> --end <YYYY-MM-DD> [--no-stress] [--shock 0.20] [--vol-multiplier 2.0] \
[--results-csv <path>] [--training-set <path>] [--pretty]";

#[derive(Debug, Clone, PartialEq)]
struct RunnerArgs {
    prices: PathBuf,
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    stress: bool,
    shock: f64,
    vol_multiplier: f64,
    results_csv: Option<PathBuf>,
    training_set: Option<PathBuf>,
    pretty: bool,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn required<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    flag_value(args, flag).with_context(|| format!("missing {}\n{}", flag, USAGE))
}

fn date_arg(args: &[String], flag: &str) -> Result<NaiveDate> {
    let raw = required(args, flag)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("{} expects YYYY-MM-DD, got '{}'", flag, raw))
}

fn number_arg(args: &[String], flag: &str, default: f64) -> Result<f64> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} expects a number, got '{}'", flag, raw)),
        None => Ok(default),
    }
}

impl RunnerArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let parsed = Self {
            prices: PathBuf::from(required(args, "--prices")?),
            ticker: required(args, "--ticker")?.to_uppercase(),
            start: date_arg(args, "--start")?,
            end: date_arg(args, "--end")?,
            stress: !args.iter().any(|a| a == "--no-stress"),
            shock: number_arg(args, "--shock", StressScenario::default().drop_pct)?,
            vol_multiplier: number_arg(args, "--vol-multiplier", 2.0)?,
            results_csv: flag_value(args, "--results-csv").map(PathBuf::from),
            training_set: flag_value(args, "--training-set").map(PathBuf::from),
            pretty: args.iter().any(|a| a == "--pretty"),
        };

        if parsed.start > parsed.end {
            bail!("--start {} is after --end {}", parsed.start, parsed.end);
        }
        Ok(parsed)
    }
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    // Logs go to stderr so stdout carries only the report.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }
    let opts = RunnerArgs::parse(&args)?;

    let config = EngineConfig::from_env().context("invalid ECHO_* configuration")?;
    let engine = BacktestEngine::new(config)?;

    let source = CsvPriceSource::new(&opts.prices);
    let series = source
        .fetch_prices(&opts.ticker, opts.start, opts.end)
        .await
        .with_context(|| format!("loading prices from {}", opts.prices.display()))?;
    info!(
        "{}: {} prices from {} to {}",
        opts.ticker,
        series.len(),
        opts.start,
        opts.end
    );

    let features = engine.prepare_features(&series)?;
    let comparison = engine.run_comparison(&features);

    let stress = if opts.stress {
        let scenario = StressScenario::new(opts.shock, ShockPoint::Fraction(0.75));
        Some(run_stress_test(&engine, &series, scenario)?)
    } else {
        None
    };

    if let (Some(today), Some(held)) = (features.last(), comparison.strategy.last()) {
        let reaction = crisis_reaction(
            today,
            &held.allocation(),
            opts.shock,
            opts.vol_multiplier,
            engine.config(),
        )?;
        info!(
            "Crisis lab: {:.0}% shock moves the portfolio {:.2}%, regime {} ({}). {}",
            opts.shock * 100.0,
            reaction.immediate_impact * 100.0,
            reaction.stressed_regime,
            reaction.reasoning,
            reaction.message
        );
    } else {
        warn!(
            "{}: not enough history for a backtest (need more than {} feature rows)",
            opts.ticker, config.simulation.warmup_period
        );
    }

    if let Some(path) = &opts.results_csv {
        export::write_results(path, &comparison.strategy.results)?;
        info!("Wrote strategy trace to {}", path.display());
    }
    if let Some(path) = &opts.training_set {
        let count = export::write_training_set(path, &features, &comparison.strategy.results)?;
        info!("Wrote {} labeled samples to {}", count, path.display());
    }

    let report = build_report(&opts.ticker, comparison, stress.as_ref(), &TemplateExplainer).await;
    let out = if opts.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", out);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("backtest-runner")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = RunnerArgs::parse(&args(&[
            "--prices", "data", "--ticker", "spy", "--start", "2020-01-01", "--end", "2023-12-31",
        ]))
        .unwrap();

        assert_eq!(parsed.ticker, "SPY");
        assert_eq!(parsed.prices, PathBuf::from("data"));
        assert!(parsed.stress);
        assert_eq!(parsed.shock, 0.20);
        assert_eq!(parsed.vol_multiplier, 2.0);
        assert_eq!(parsed.results_csv, None);
        assert!(!parsed.pretty);
    }

    #[test]
    fn test_parse_optional_flags() {
        let parsed = RunnerArgs::parse(&args(&[
            "--prices",
            "spy.csv",
            "--ticker",
            "SPY",
            "--start",
            "2020-01-01",
            "--end",
            "2020-12-31",
            "--no-stress",
            "--shock",
            "0.35",
            "--results-csv",
            "out.csv",
            "--pretty",
        ]))
        .unwrap();

        assert!(!parsed.stress);
        assert_eq!(parsed.shock, 0.35);
        assert_eq!(parsed.results_csv, Some(PathBuf::from("out.csv")));
        assert!(parsed.pretty);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(RunnerArgs::parse(&args(&["--ticker", "SPY"])).is_err());
        assert!(RunnerArgs::parse(&args(&[
            "--prices", "d", "--ticker", "SPY", "--start", "01/01/2020", "--end", "2020-12-31",
        ]))
        .is_err());
        assert!(RunnerArgs::parse(&args(&[
            "--prices", "d", "--ticker", "SPY", "--start", "2021-01-01", "--end", "2020-12-31",
        ]))
        .is_err());
    }
}
