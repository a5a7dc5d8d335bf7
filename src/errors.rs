//! Error types for the telemetry ingestor

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IngestError>;

/// File-level errors. Each one is terminal for the input it was raised on.
#[derive(Debug)]
pub enum IngestError {
    /// The input source does not exist
    NotFound { path: PathBuf },

    /// The input source exists but could not be opened
    OpenFailed { path: PathBuf, source: std::io::Error },

    /// Reading the input failed part way through the scan
    ReadFailed { name: String, source: ScanError },

    /// Configuration error
    Config(String),

    /// Zip archive could not be read
    Archive { path: PathBuf, source: zip::result::ZipError },

    /// Worker pool could not accept or finish jobs
    WorkerPool(String),

    /// HTTP client could not be built
    Http(reqwest::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::NotFound { path } => write!(f, "file not found: {}", path.display()),
            IngestError::OpenFailed { path, source } => {
                write!(f, "failed to open file {}: {}", path.display(), source)
            }
            IngestError::ReadFailed { name, source } => {
                write!(f, "error reading file {}: {}", name, source)
            }
            IngestError::Config(msg) => write!(f, "Configuration error: {}", msg),
            IngestError::Archive { path, source } => {
                write!(f, "failed to read archive {}: {}", path.display(), source)
            }
            IngestError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
            IngestError::Http(err) => write!(f, "HTTP error: {}", err),
            IngestError::Io(err) => write!(f, "IO error: {}", err),
            IngestError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::OpenFailed { source, .. } => Some(source),
            IngestError::ReadFailed { source, .. } => Some(source),
            IngestError::Archive { source, .. } => Some(source),
            IngestError::Http(err) => Some(err),
            IngestError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err)
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Http(err)
    }
}

/// Errors raised by the line scanner
#[derive(Debug)]
pub enum ScanError {
    /// A line did not fit in the configured maximum buffer
    LineTooLong { line: usize, limit: usize },

    /// The underlying reader failed
    Io(std::io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::LineTooLong { line, limit } => {
                write!(f, "line {} exceeds maximum buffer capacity of {} bytes", line, limit)
            }
            ScanError::Io(err) => write!(f, "read failed: {}", err),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(err) => Some(err),
            ScanError::LineTooLong { .. } => None,
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err)
    }
}

/// Per-job errors returned by the HTTP transport.
///
/// A non-success status from the collector is not an error here; it is only
/// visible through the failure counter and the log.
#[derive(Debug)]
pub enum TransportError {
    /// Payload could not be serialized; nothing was sent or counted
    Encoding(serde_json::Error),

    /// The request could not be delivered (connect failure, timeout)
    Request { endpoint: String, source: reqwest::Error },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Encoding(err) => write!(f, "failed to marshal JSON: {}", err),
            TransportError::Request { endpoint, source } => {
                write!(f, "failed to send request to {}: {}", endpoint, source)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Encoding(err) => Some(err),
            TransportError::Request { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Encoding(err)
    }
}
