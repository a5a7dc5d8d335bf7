//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use telemetry_ingestor::{Config, Endpoints, TelemetryKind};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Stand-in OTLP/HTTP collector answering every signal path with a fixed status
pub struct MockCollector {
    pub server: MockServer,
}

impl MockCollector {
    pub async fn accepting() -> Self {
        Self::with_status(200).await
    }

    pub async fn rejecting() -> Self {
        Self::with_status(500).await
    }

    async fn with_status(status: u16) -> Self {
        let server = MockServer::start().await;
        for kind in TelemetryKind::ALL {
            Mock::given(method("POST"))
                .and(path(signal_path(kind)))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }
        Self { server }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::from_base_url(&self.server.uri())
    }

    /// Bodies received for one kind, in arrival order
    pub async fn received(&self, kind: TelemetryKind) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == signal_path(kind))
            .map(|req| req.body_json::<Value>().unwrap())
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.unwrap_or_default().len()
    }
}

fn signal_path(kind: TelemetryKind) -> &'static str {
    match kind {
        TelemetryKind::Traces => "/v1/traces",
        TelemetryKind::Logs => "/v1/logs",
        TelemetryKind::Metrics => "/v1/metrics",
    }
}

/// Endpoints on a port nothing listens on
pub fn unreachable_endpoints() -> Endpoints {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    Endpoints::from_base_url(&base)
}

pub fn config(endpoints: Endpoints, send_all: bool) -> Config {
    Config {
        endpoints,
        send_all,
        http_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn telemetry_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn write_lines(path: &Path, lines: &[&str]) {
    std::fs::write(path, lines.join("\n") + "\n").unwrap();
}
