use std::env;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Volatility cut-offs for the regime cascade (annualized).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    pub high_vol_threshold: f64,
    pub crash_threshold: f64,
}

impl RegimeThresholds {
    pub fn new(high_vol_threshold: f64, crash_threshold: f64) -> Result<Self, AnalysisError> {
        let thresholds = Self {
            high_vol_threshold,
            crash_threshold,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        non_negative("high_vol_threshold", self.high_vol_threshold)?;
        non_negative("crash_threshold", self.crash_threshold)?;
        if self.crash_threshold <= self.high_vol_threshold {
            return Err(AnalysisError::InvalidConfig(format!(
                "crash_threshold ({}) must exceed high_vol_threshold ({})",
                self.crash_threshold, self.high_vol_threshold
            )));
        }
        Ok(())
    }
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            high_vol_threshold: 0.20,
            crash_threshold: 0.40,
        }
    }
}

/// Risk overlay limits.
///
/// `max_drawdown` is a positive magnitude (0.20 = 20% below the trailing peak).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    pub target_vol: f64,
    pub max_drawdown: f64,
}

impl RiskParameters {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.target_vol.is_finite() || self.target_vol <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "target_vol must be positive, got {}",
                self.target_vol
            )));
        }
        non_negative("max_drawdown", self.max_drawdown)
    }
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            target_vol: 0.15,
            max_drawdown: 0.20,
        }
    }
}

/// Portfolio accounting and annualization constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub initial_capital: f64,
    /// Leading feature rows used as history only; no result is dated inside them.
    pub warmup_period: usize,
    pub bond_annual_yield: f64,
    pub risk_free_rate: f64,
    pub trading_days_per_year: f64,
}

impl SimulationParameters {
    pub fn daily_bond_return(&self) -> f64 {
        self.bond_annual_yield / self.trading_days_per_year
    }

    pub fn annualization_factor(&self) -> f64 {
        self.trading_days_per_year.sqrt()
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.warmup_period == 0 {
            return Err(AnalysisError::InvalidConfig(
                "warmup_period must be at least 1".to_string(),
            ));
        }
        if !self.trading_days_per_year.is_finite() || self.trading_days_per_year <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "trading_days_per_year must be positive, got {}",
                self.trading_days_per_year
            )));
        }
        if !self.bond_annual_yield.is_finite() || !self.risk_free_rate.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "bond_annual_yield and risk_free_rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            warmup_period: 200,
            bond_annual_yield: 0.02,
            risk_free_rate: 0.02,
            trading_days_per_year: 252.0,
        }
    }
}

/// Every recognized engine option, with defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub regime: RegimeThresholds,
    pub risk: RiskParameters,
    pub simulation: SimulationParameters,
}

impl EngineConfig {
    /// Read overrides from `ECHO_*` environment variables; unset keys keep defaults.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let defaults = Self::default();
        let config = Self {
            regime: RegimeThresholds {
                high_vol_threshold: env_or(
                    "ECHO_HIGH_VOL_THRESHOLD",
                    defaults.regime.high_vol_threshold,
                )?,
                crash_threshold: env_or("ECHO_CRASH_THRESHOLD", defaults.regime.crash_threshold)?,
            },
            risk: RiskParameters {
                target_vol: env_or("ECHO_TARGET_VOL", defaults.risk.target_vol)?,
                max_drawdown: env_or("ECHO_MAX_DRAWDOWN", defaults.risk.max_drawdown)?,
            },
            simulation: SimulationParameters {
                initial_capital: env_or(
                    "ECHO_INITIAL_CAPITAL",
                    defaults.simulation.initial_capital,
                )?,
                warmup_period: env_or("ECHO_WARMUP_PERIOD", defaults.simulation.warmup_period)?,
                bond_annual_yield: env_or("ECHO_BOND_YIELD", defaults.simulation.bond_annual_yield)?,
                risk_free_rate: env_or("ECHO_RISK_FREE_RATE", defaults.simulation.risk_free_rate)?,
                trading_days_per_year: env_or(
                    "ECHO_TRADING_DAYS",
                    defaults.simulation.trading_days_per_year,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.regime.validate()?;
        self.risk.validate()?;
        self.simulation.validate()
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AnalysisError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AnalysisError::InvalidConfig(format!("{}={}: {}", key, raw, e))),
        _ => Ok(default),
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.regime.high_vol_threshold, 0.20);
        assert_eq!(config.regime.crash_threshold, 0.40);
        assert_eq!(config.risk.target_vol, 0.15);
        assert_eq!(config.risk.max_drawdown, 0.20);
        assert_eq!(config.simulation.initial_capital, 10_000.0);
        assert_eq!(config.simulation.warmup_period, 200);
        assert_eq!(config.simulation.bond_annual_yield, 0.02);
        assert_eq!(config.simulation.risk_free_rate, 0.02);
        assert_eq!(config.simulation.trading_days_per_year, 252.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        assert!(RegimeThresholds::new(0.20, 0.40).is_ok());
        assert!(matches!(
            RegimeThresholds::new(0.40, 0.20),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(RegimeThresholds::new(0.30, 0.30).is_err());
        assert!(RegimeThresholds::new(-0.1, 0.30).is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"risk": {"target_vol": 0.10}}"#).unwrap();
        assert_eq!(config.risk.target_vol, 0.10);
        assert_eq!(config.risk.max_drawdown, 0.20);
        assert_eq!(config.regime, RegimeThresholds::default());
    }

    #[test]
    fn test_daily_bond_return() {
        let sim = SimulationParameters::default();
        assert!((sim.daily_bond_return() - 0.02 / 252.0).abs() < 1e-15);
        assert!((sim.annualization_factor() - 252f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_from_env_overrides_and_rejects_garbage() {
        env::set_var("ECHO_TARGET_VOL", "0.12");
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.risk.target_vol, 0.12);

        env::set_var("ECHO_TARGET_VOL", "twelve");
        assert!(matches!(
            EngineConfig::from_env(),
            Err(AnalysisError::InvalidConfig(_))
        ));
        env::remove_var("ECHO_TARGET_VOL");
    }
}
