use std::time::Duration;

use thiserror::Error;

pub const BUCKET_ENV: &str = "S3_BUCKET";
pub const RESULTS_PREFIX_ENV: &str = "RESULTS_PREFIX";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidTimeout { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub bucket: String,
    pub results_prefix: String,
    pub request_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket = lookup(BUCKET_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(BUCKET_ENV))?;

        let results_prefix = lookup(RESULTS_PREFIX_ENV).unwrap_or_default();

        let timeout_secs = match lookup(REQUEST_TIMEOUT_ENV) {
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    name: REQUEST_TIMEOUT_ENV,
                    value,
                })?,
        };

        Ok(Self {
            bucket,
            results_prefix,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn applies_defaults_when_optional_values_are_absent() {
        let config =
            WorkerConfig::from_lookup(lookup_from(&[(BUCKET_ENV, "results")])).expect("valid");

        assert_eq!(config.bucket, "results");
        assert_eq!(config.results_prefix, "");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn requires_bucket() {
        let error = WorkerConfig::from_lookup(lookup_from(&[(BUCKET_ENV, "  ")]))
            .expect_err("blank bucket should fail");
        assert_eq!(error, ConfigError::Missing(BUCKET_ENV));
    }

    #[test]
    fn reads_prefix_and_timeout() {
        let config = WorkerConfig::from_lookup(lookup_from(&[
            (BUCKET_ENV, "results"),
            (RESULTS_PREFIX_ENV, "fanout/run-7"),
            (REQUEST_TIMEOUT_ENV, "5"),
        ]))
        .expect("valid");

        assert_eq!(config.results_prefix, "fanout/run-7");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_timeout() {
        let error = WorkerConfig::from_lookup(lookup_from(&[
            (BUCKET_ENV, "results"),
            (REQUEST_TIMEOUT_ENV, "0"),
        ]))
        .expect_err("zero timeout should fail");
        assert!(matches!(error, ConfigError::InvalidTimeout { .. }));
    }
}
