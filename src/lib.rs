//! Telemetry Ingestor Library
//!
//! Reads OTLP JSON Lines telemetry (traces, logs, metrics) and forwards it to
//! OpenTelemetry collector endpoints over HTTP, either every record or only
//! the latest record of each kind.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod ingest;
pub mod parser;
pub mod pool;
pub mod scanner;
pub mod sources;
pub mod stats;
pub mod telemetry;
pub mod transport;

pub use cli::Cli;
pub use config::{Config, Endpoints};
pub use dispatch::{DispatchReport, DispatchStrategy, FanOut, LatestOnly};
pub use errors::{IngestError, Result, ScanError, TransportError};
pub use ingest::{IngestReport, Ingestor};
pub use stats::{OutcomeCounters, SendSummary};
pub use telemetry::{SendJob, TelemetryKind, TelemetryRecord};
