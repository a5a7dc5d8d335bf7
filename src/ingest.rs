//! Per-file ingestion entry points

use crate::config::Config;
use crate::dispatch::{strategy_for, DispatchReport, DispatchStrategy};
use crate::errors::{IngestError, Result};
use crate::scanner::LineScanner;
use crate::stats::OutcomeCounters;
use crate::transport::HttpTransport;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, instrument, Instrument};
use uuid::Uuid;

/// Result of ingesting one input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub name: String,
    pub run_id: String,
    pub records: usize,
    pub jobs: usize,
}

/// Open `path` for reading, telling a missing file apart from one that cannot be opened
pub async fn open_source(path: &Path) -> Result<File> {
    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        _ => {}
    }

    File::open(path).await.map_err(|source| IngestError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the ingestion pipeline for one input at a time
pub struct Ingestor {
    config: Config,
    strategy: Box<dyn DispatchStrategy>,
}

impl Ingestor {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(IngestError::Config)?;

        let transport = Arc::new(HttpTransport::new(config.http_timeout)?);
        let strategy = strategy_for(&config, transport);

        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingest a file on disk, recording send outcomes in `counters`
    #[instrument(skip(self, path, counters), fields(file = %path.display()))]
    pub async fn ingest_file(&self, path: &Path, counters: &Arc<OutcomeCounters>) -> Result<IngestReport> {
        let name = path.display().to_string();
        self.ingest_file_as(path, &name, counters).await
    }

    /// Ingest a file on disk under a different logical name (e.g. an archive entry)
    pub async fn ingest_file_as(
        &self,
        path: &Path,
        name: &str,
        counters: &Arc<OutcomeCounters>,
    ) -> Result<IngestReport> {
        info!(file = name, "Reading telemetry data");
        let file = open_source(path).await?;
        self.ingest_reader(BufReader::new(file), name, counters).await
    }

    /// Ingest any line-oriented stream
    pub async fn ingest_reader<R>(
        &self,
        reader: R,
        name: &str,
        counters: &Arc<OutcomeCounters>,
    ) -> Result<IngestReport>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("ingest", run_id = %run_id, source = name);

        async {
            if self.config.send_all {
                info!("Mode: Sending all telemetry lines");
            } else {
                info!("Mode: Scanning file to find last instances of each telemetry type");
            }

            let mut scanner = LineScanner::new(reader, self.config.max_buffer_capacity);
            let DispatchReport { records, jobs } =
                self.strategy.dispatch(name, &mut scanner, counters).await?;

            Ok::<_, IngestError>(IngestReport {
                name: name.to_string(),
                run_id: run_id.clone(),
                records,
                jobs,
            })
        }
        .instrument(span)
        .await
    }
}
