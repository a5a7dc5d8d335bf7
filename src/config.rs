//! Configuration for telemetry ingestion

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::telemetry::TelemetryKind;

pub const DEFAULT_OTEL_TRACES_ENDPOINT: &str = "http://localhost:4318/v1/traces";
pub const DEFAULT_OTEL_LOGS_ENDPOINT: &str = "http://localhost:4318/v1/logs";
pub const DEFAULT_OTEL_METRICS_ENDPOINT: &str = "http://localhost:4318/v1/metrics";
pub const DEFAULT_MAX_BUFFER_CAPACITY: usize = 1024 * 1024;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FILE_PATTERN: &str = "*.json";

/// Collector endpoints, one per telemetry kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub traces: String,
    pub logs: String,
    pub metrics: String,
}

impl Endpoints {
    pub fn for_kind(&self, kind: TelemetryKind) -> &str {
        match kind {
            TelemetryKind::Traces => &self.traces,
            TelemetryKind::Logs => &self.logs,
            TelemetryKind::Metrics => &self.metrics,
        }
    }

    /// All three endpoints under one collector base URL, e.g. `http://localhost:4318`
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            traces: format!("{}/v1/traces", base),
            logs: format!("{}/v1/logs", base),
            metrics: format!("{}/v1/metrics", base),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            traces: DEFAULT_OTEL_TRACES_ENDPOINT.to_string(),
            logs: DEFAULT_OTEL_LOGS_ENDPOINT.to_string(),
            metrics: DEFAULT_OTEL_METRICS_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File (or folder, for folder ingestion) to read
    pub file_path: PathBuf,

    /// Collector endpoints per telemetry kind
    pub endpoints: Endpoints,

    /// Longest accepted input line in bytes
    pub max_buffer_capacity: usize,

    /// Send every matching line instead of only the last one per kind
    pub send_all: bool,

    /// Concurrent senders used when `send_all` is set
    pub workers: usize,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Glob matched against file names during folder ingestion
    pub file_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("telemetry.json"),
            endpoints: Endpoints::default(),
            max_buffer_capacity: DEFAULT_MAX_BUFFER_CAPACITY,
            send_all: false,
            workers: DEFAULT_WORKERS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for kind in TelemetryKind::ALL {
            if self.endpoints.for_kind(kind).is_empty() {
                return Err(format!("{} endpoint cannot be empty", kind.to_string().to_lowercase()));
            }
        }

        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }

        if self.max_buffer_capacity == 0 {
            return Err("max_buffer_capacity must be greater than 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        if let Err(e) = glob::Pattern::new(&self.file_pattern) {
            return Err(format!("invalid file pattern '{}': {}", self.file_pattern, e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoints.traces, "http://localhost:4318/v1/traces");
        assert_eq!(config.endpoints.logs, "http://localhost:4318/v1/logs");
        assert_eq!(config.endpoints.metrics, "http://localhost:4318/v1/metrics");
        assert_eq!(config.max_buffer_capacity, 1024 * 1024);
        assert_eq!(config.workers, 10);
        assert!(!config.send_all);
        assert_eq!(config.file_path, PathBuf::from("telemetry.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_lookup() {
        let endpoints = Endpoints::from_base_url("http://collector:4318/");
        assert_eq!(endpoints.for_kind(TelemetryKind::Traces), "http://collector:4318/v1/traces");
        assert_eq!(endpoints.for_kind(TelemetryKind::Logs), "http://collector:4318/v1/logs");
        assert_eq!(endpoints.for_kind(TelemetryKind::Metrics), "http://collector:4318/v1/metrics");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_buffer_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.endpoints.logs.clear();
        assert_eq!(config.validate().unwrap_err(), "logs endpoint cannot be empty");

        let mut config = Config::default();
        config.file_pattern = "[".to_string();
        assert!(config.validate().is_err());
    }
}
