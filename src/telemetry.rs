//! Telemetry data structures and utilities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RESOURCE_SPANS_FIELD: &str = "resourceSpans";
pub const RESOURCE_LOGS_FIELD: &str = "resourceLogs";
pub const RESOURCE_METRICS_FIELD: &str = "resourceMetrics";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TelemetryKind {
    Traces,
    Logs,
    Metrics,
}

impl TelemetryKind {
    pub const ALL: [TelemetryKind; 3] = [
        TelemetryKind::Traces,
        TelemetryKind::Logs,
        TelemetryKind::Metrics,
    ];

    /// Top-level OTLP JSON field carrying this kind
    pub fn field(self) -> &'static str {
        match self {
            TelemetryKind::Traces => RESOURCE_SPANS_FIELD,
            TelemetryKind::Logs => RESOURCE_LOGS_FIELD,
            TelemetryKind::Metrics => RESOURCE_METRICS_FIELD,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            TelemetryKind::Traces => 0,
            TelemetryKind::Logs => 1,
            TelemetryKind::Metrics => 2,
        }
    }
}

impl std::fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryKind::Traces => write!(f, "Traces"),
            TelemetryKind::Logs => write!(f, "Logs"),
            TelemetryKind::Metrics => write!(f, "Metrics"),
        }
    }
}

/// One parsed line of input.
///
/// Field order and any fields besides the three resource keys are kept as-is.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TelemetryRecord(Map<String, Value>);

impl TelemetryRecord {
    /// Sub-value carried for `kind`, if the key is present at all
    pub fn get(&self, kind: TelemetryKind) -> Option<&Value> {
        self.0.get(kind.field())
    }

    pub fn contains(&self, kind: TelemetryKind) -> bool {
        self.0.contains_key(kind.field())
    }

    pub fn resource_spans(&self) -> Option<&Value> {
        self.get(TelemetryKind::Traces)
    }

    pub fn resource_logs(&self) -> Option<&Value> {
        self.get(TelemetryKind::Logs)
    }

    pub fn resource_metrics(&self) -> Option<&Value> {
        self.get(TelemetryKind::Metrics)
    }

    /// Single-key payload holding only this kind's sub-value
    pub fn payload_for(&self, kind: TelemetryKind) -> Option<Map<String, Value>> {
        self.get(kind).map(|value| {
            let mut payload = Map::with_capacity(1);
            payload.insert(kind.field().to_string(), value.clone());
            payload
        })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A request to deliver one kind's payload to its endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct SendJob {
    pub endpoint: String,
    pub payload: Map<String, Value>,
    pub kind: TelemetryKind,
    pub line_number: usize,
}

impl SendJob {
    /// Build the job for `kind` out of `record`, or `None` if the record lacks it
    pub fn from_record(
        record: &TelemetryRecord,
        kind: TelemetryKind,
        endpoint: &str,
        line_number: usize,
    ) -> Option<Self> {
        record.payload_for(kind).map(|payload| Self {
            endpoint: endpoint.to_string(),
            payload,
            kind,
            line_number,
        })
    }
}
