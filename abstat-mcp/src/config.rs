//! Server configuration from environment variables
//!
//! - `ABSTAT_DEFAULT_ALPHA`: significance level when a call omits `alpha` (0.05)
//! - `ABSTAT_DEFAULT_POWER`: target power when a planner call omits `power` (0.8)
//! - `RUST_LOG`: log filter directive (info)

use abstat_plugin::CalcContext;
use std::env;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ALPHA_VAR: &str = "ABSTAT_DEFAULT_ALPHA";
pub const POWER_VAR: &str = "ABSTAT_DEFAULT_POWER";
pub const LOG_VAR: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a number")]
    NotANumber { var: &'static str, value: String },

    #[error("{var}: {value} must lie strictly between 0 and 1")]
    OutOfRange { var: &'static str, value: f64 },

    #[error("{var}: '{value}' is not a valid log filter: {reason}")]
    InvalidLogFilter { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub default_alpha: f64,
    pub default_power: f64,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_alpha: 0.05,
            default_power: 0.8,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_alpha = match get(ALPHA_VAR) {
            Some(raw) => parse_probability(ALPHA_VAR, &raw)?,
            None => defaults.default_alpha,
        };
        let default_power = match get(POWER_VAR) {
            Some(raw) => parse_probability(POWER_VAR, &raw)?,
            None => defaults.default_power,
        };

        let log_filter = get(LOG_VAR).unwrap_or(defaults.log_filter);
        parse_log_filter(&log_filter)?;

        Ok(Self {
            default_alpha,
            default_power,
            log_filter,
        })
    }

    /// Subscriber filter for the configured directives
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        parse_log_filter(&self.log_filter)
    }

    pub fn calc_context(&self) -> CalcContext {
        CalcContext::new()
            .with_alpha(self.default_alpha)
            .with_power(self.default_power)
    }
}

fn parse_probability(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: raw.to_string(),
    })?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { var, value })
    }
}

fn parse_log_filter(raw: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(raw).map_err(|e| ConfigError::InvalidLogFilter {
        var: LOG_VAR,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
