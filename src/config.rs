use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::geo::zones::SamplingBudget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub order_max_age: Duration,
    pub order_generation_interval: Duration,
    pub order_sweep_interval: Duration,
    pub max_active_orders: u64,
    pub courier_visibility_radius_m: f64,
    pub sampling: SamplingBudget,
    pub status_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            order_max_age: Duration::from_secs(120),
            order_generation_interval: Duration::from_millis(1_000),
            order_sweep_interval: Duration::from_millis(5_000),
            max_active_orders: 200,
            courier_visibility_radius_m: 2_800.0,
            sampling: SamplingBudget::default(),
            status_buffer_size: 64,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            order_max_age: Duration::from_secs(parse_or_default(
                "ORDER_MAX_AGE_SECS",
                defaults.order_max_age.as_secs(),
            )?),
            order_generation_interval: Duration::from_millis(parse_or_default(
                "ORDER_GENERATION_INTERVAL_MS",
                defaults.order_generation_interval.as_millis() as u64,
            )?),
            order_sweep_interval: Duration::from_millis(parse_or_default(
                "ORDER_SWEEP_INTERVAL_MS",
                defaults.order_sweep_interval.as_millis() as u64,
            )?),
            max_active_orders: parse_or_default("MAX_ACTIVE_ORDERS", defaults.max_active_orders)?,
            courier_visibility_radius_m: parse_or_default(
                "COURIER_VISIBILITY_RADIUS_M",
                defaults.courier_visibility_radius_m,
            )?,
            sampling: SamplingBudget {
                polygon_attempts: parse_or_default(
                    "POLYGON_SAMPLE_ATTEMPTS",
                    defaults.sampling.polygon_attempts,
                )?,
                zone_attempts: parse_or_default(
                    "ZONE_SAMPLE_ATTEMPTS",
                    defaults.sampling.zone_attempts,
                )?,
            },
            status_buffer_size: parse_or_default("STATUS_BUFFER_SIZE", defaults.status_buffer_size)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.order_max_age.is_zero() {
            return Err(AppError::Internal("ORDER_MAX_AGE_SECS must be > 0".to_string()));
        }
        if self.order_generation_interval.is_zero() || self.order_sweep_interval.is_zero() {
            return Err(AppError::Internal("ticker intervals must be > 0".to_string()));
        }
        if !(self.courier_visibility_radius_m.is_finite() && self.courier_visibility_radius_m >= 0.0)
        {
            return Err(AppError::Internal(
                "COURIER_VISIBILITY_RADIUS_M must be a non-negative number".to_string(),
            ));
        }
        if self.status_buffer_size == 0 {
            return Err(AppError::Internal("STATUS_BUFFER_SIZE must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.order_max_age, Duration::from_secs(120));
        assert_eq!(config.courier_visibility_radius_m, 2_800.0);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = Config {
            order_sweep_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
