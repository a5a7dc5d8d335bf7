//! HTTP transport layer for sending telemetry payloads to the collector

use crate::errors::{IngestError, Result, TransportError};
use crate::stats::OutcomeCounters;
use crate::telemetry::TelemetryKind;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// HTTP transport for telemetry payloads
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("telemetry_ingestor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(IngestError::Http)?;

        Ok(Self {
            client,
            timeout: http_timeout,
        })
    }

    /// POST `payload` as JSON to `endpoint` and record the outcome for `kind`.
    ///
    /// Encoding failures return before any request or counter update. Only a 200
    /// response counts as success; any other status is a failure but not an `Err`.
    pub async fn send<P>(
        &self,
        endpoint: &str,
        payload: &P,
        kind: TelemetryKind,
        counters: &OutcomeCounters,
    ) -> std::result::Result<(), TransportError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)?;

        debug!(kind = %kind, endpoint, bytes = body.len(), "Sending telemetry");

        let response = match self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                counters.record_failure(kind);
                return Err(TransportError::Request {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
        };

        self.handle_response(response, kind, counters).await;
        Ok(())
    }

    /// Handle the HTTP response from the collector
    async fn handle_response(&self, response: Response, kind: TelemetryKind, counters: &OutcomeCounters) {
        let status = response.status();

        if status == StatusCode::OK {
            counters.record_success(kind);
            debug!(kind = %kind, status = status.as_u16(), "Telemetry accepted by collector");
            return;
        }

        counters.record_failure(kind);
        let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        error!(
            kind = %kind,
            status = status.as_u16(),
            response = %body,
            "Failed to send telemetry"
        );
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
