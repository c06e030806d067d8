use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use clinic_api::{AppointmentClient, ApiError, CircuitConfig, RetryPolicy};
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_UPSTREAM_URL: &str = "http://clinic-medical:8080";
const DEFAULT_GATEWAY_PORT: u16 = 8081;
const DEFAULT_METRICS_PORT: u16 = 8080;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_PERIOD_MS: u64 = 100;
const DEFAULT_RETRY_MAX_PERIOD_MS: u64 = 1000;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_CIRCUIT_OPEN_SECS: u64 = 30;

/// Runtime configuration for the gateway.
///
/// Every field can be set through an environment variable. Invalid values
/// are logged and replaced by the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// `CLINIC_MEDICAL_URL`
    pub upstream_url: String,
    /// `GATEWAY_PORT`
    pub port: u16,
    /// `METRICS_PORT`
    pub metrics_port: u16,
    /// `UPSTREAM_TIMEOUT_SECS`
    pub upstream_timeout_secs: u64,
    /// `RETRY_PERIOD_MS`
    pub retry_period_ms: u64,
    /// `RETRY_MAX_PERIOD_MS`
    pub retry_max_period_ms: u64,
    /// `RETRY_MAX_ATTEMPTS`
    pub retry_max_attempts: u32,
    /// `CIRCUIT_BREAKER_ENABLED`
    pub circuit_breaker_enabled: bool,
    /// `CIRCUIT_FAILURE_THRESHOLD`
    pub circuit_failure_threshold: u32,
    /// `CIRCUIT_OPEN_SECS`
    pub circuit_open_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            port: DEFAULT_GATEWAY_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            retry_period_ms: DEFAULT_RETRY_PERIOD_MS,
            retry_max_period_ms: DEFAULT_RETRY_MAX_PERIOD_MS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            circuit_breaker_enabled: true,
            circuit_failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            circuit_open_secs: DEFAULT_CIRCUIT_OPEN_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_url: std::env::var("CLINIC_MEDICAL_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
            port: env_or("GATEWAY_PORT", defaults.port),
            metrics_port: env_or("METRICS_PORT", defaults.metrics_port),
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout_secs),
            retry_period_ms: env_or("RETRY_PERIOD_MS", defaults.retry_period_ms),
            retry_max_period_ms: env_or("RETRY_MAX_PERIOD_MS", defaults.retry_max_period_ms),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            circuit_breaker_enabled: env_flag(
                "CIRCUIT_BREAKER_ENABLED",
                defaults.circuit_breaker_enabled,
            ),
            circuit_failure_threshold: env_or(
                "CIRCUIT_FAILURE_THRESHOLD",
                defaults.circuit_failure_threshold,
            ),
            circuit_open_secs: env_or("CIRCUIT_OPEN_SECS", defaults.circuit_open_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            period: Duration::from_millis(self.retry_period_ms),
            max_period: Duration::from_millis(self.retry_max_period_ms),
            max_attempts: self.retry_max_attempts,
        }
    }

    pub fn circuit_config(&self) -> CircuitConfig {
        CircuitConfig {
            enabled: self.circuit_breaker_enabled,
            failure_threshold: self.circuit_failure_threshold,
            open_duration: Duration::from_secs(self.circuit_open_secs),
        }
    }

    /// Build the upstream client described by this configuration.
    pub fn build_client(&self) -> Result<AppointmentClient, ApiError> {
        let client = AppointmentClient::with_timeout(
            &self.upstream_url,
            Duration::from_secs(self.upstream_timeout_secs),
        )?;
        Ok(client
            .with_retry_policy(self.retry_policy())
            .with_circuit_breaker(self.circuit_config()))
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(s) => match s.trim().parse::<T>() {
            Ok(v) => {
                debug!(key, value = %v, "using value from env");
                v
            }
            Err(e) => {
                warn!(key, value = %s, error = %e, "invalid value, using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => {
                warn!(key, value = %s, "invalid flag, using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}
