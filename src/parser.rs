//! Line parsing and classification of telemetry records

use crate::telemetry::{TelemetryKind, TelemetryRecord};

/// Parse one input line into a record.
///
/// Blank lines yield `Ok(None)`. Anything that is not a JSON object is an error;
/// callers log it and move on to the next line.
pub fn parse_line(line: &[u8], line_number: usize) -> Result<Option<TelemetryRecord>, serde_json::Error> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let record = serde_json::from_slice::<TelemetryRecord>(line)?;
    tracing::trace!(line = line_number, fields = record.fields().len(), "Parsed telemetry line");
    Ok(Some(record))
}

/// Which telemetry kinds a record carries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindSet {
    pub traces: bool,
    pub logs: bool,
    pub metrics: bool,
}

impl KindSet {
    pub fn contains(&self, kind: TelemetryKind) -> bool {
        match kind {
            TelemetryKind::Traces => self.traces,
            TelemetryKind::Logs => self.logs,
            TelemetryKind::Metrics => self.metrics,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.traces || self.logs || self.metrics)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Present kinds in Traces, Logs, Metrics order
    pub fn iter(&self) -> impl Iterator<Item = TelemetryKind> + '_ {
        TelemetryKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

/// Key presence decides membership; the value may be anything, even `[]` or `null`.
pub fn classify(record: &TelemetryRecord) -> KindSet {
    KindSet {
        traces: record.contains(TelemetryKind::Traces),
        logs: record.contains(TelemetryKind::Logs),
        metrics: record.contains(TelemetryKind::Metrics),
    }
}
