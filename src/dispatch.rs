//! Dispatch strategies: forward every record, or only the latest per kind

use crate::config::{Config, Endpoints};
use crate::errors::{IngestError, Result};
use crate::parser::{classify, parse_line};
use crate::pool::SenderPool;
use crate::scanner::LineScanner;
use crate::stats::OutcomeCounters;
use crate::telemetry::{SendJob, TelemetryKind, TelemetryRecord};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// What one dispatch pass produced
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Lines that parsed into a record
    pub records: usize,
    /// Send jobs produced from those records
    pub jobs: usize,
}

/// Turns a stream of lines into send jobs and delivers them
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    fn mode(&self) -> &'static str;

    /// Consume `scanner` to the end. A scan failure is returned as
    /// `IngestError::ReadFailed` tagged with `name`.
    async fn dispatch(
        &self,
        name: &str,
        scanner: &mut LineScanner,
        counters: &Arc<OutcomeCounters>,
    ) -> Result<DispatchReport>;
}

/// Pick the strategy selected by `config.send_all`
pub fn strategy_for(config: &Config, transport: Arc<HttpTransport>) -> Box<dyn DispatchStrategy> {
    if config.send_all {
        Box::new(FanOut::new(config.endpoints.clone(), transport, config.workers))
    } else {
        Box::new(LatestOnly::new(config.endpoints.clone(), transport))
    }
}

/// Most recent record seen for each kind, with its line number
#[derive(Debug, Default)]
pub struct LatestByKind {
    slots: [Option<(usize, Arc<TelemetryRecord>)>; 3],
}

impl LatestByKind {
    /// Overwrite the slot of every kind `record` carries
    pub fn update(&mut self, record: TelemetryRecord, line_number: usize) {
        let kinds = classify(&record);
        if kinds.is_empty() {
            return;
        }

        let record = Arc::new(record);
        for kind in kinds.iter() {
            self.slots[kind.index()] = Some((line_number, Arc::clone(&record)));
        }
    }

    pub fn get(&self, kind: TelemetryKind) -> Option<&TelemetryRecord> {
        self.slots[kind.index()].as_ref().map(|(_, record)| record.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// One job per filled slot, in Traces, Logs, Metrics order
    pub fn into_jobs(self, endpoints: &Endpoints) -> Vec<SendJob> {
        TelemetryKind::ALL
            .into_iter()
            .zip(self.slots)
            .filter_map(|(kind, slot)| {
                let (line_number, record) = slot?;
                SendJob::from_record(&record, kind, endpoints.for_kind(kind), line_number)
            })
            .collect()
    }
}

/// Sends only the last record of each kind once the whole stream is read
pub struct LatestOnly {
    endpoints: Endpoints,
    transport: Arc<HttpTransport>,
}

impl LatestOnly {
    pub fn new(endpoints: Endpoints, transport: Arc<HttpTransport>) -> Self {
        Self { endpoints, transport }
    }

    /// Scan the full stream, keeping the latest record per kind
    pub async fn scan(name: &str, scanner: &mut LineScanner) -> Result<(LatestByKind, usize)> {
        let mut latest = LatestByKind::default();
        let mut records = 0;

        while let Some((line_number, line)) = scanner.next_line().await.map_err(|source| {
            IngestError::ReadFailed {
                name: name.to_string(),
                source,
            }
        })? {
            match parse_line(line, line_number) {
                Ok(Some(record)) => {
                    records += 1;
                    latest.update(record, line_number);
                }
                Ok(None) => {}
                Err(e) => error!(line = line_number, error = %e, "Error parsing line"),
            }
        }

        info!(total_lines = records, "Finished reading file");
        Ok((latest, records))
    }
}

#[async_trait]
impl DispatchStrategy for LatestOnly {
    fn mode(&self) -> &'static str {
        "latest-only"
    }

    async fn dispatch(
        &self,
        name: &str,
        scanner: &mut LineScanner,
        counters: &Arc<OutcomeCounters>,
    ) -> Result<DispatchReport> {
        let (latest, records) = Self::scan(name, scanner).await?;

        let jobs = latest.into_jobs(&self.endpoints);
        if !jobs.is_empty() {
            info!("Sending last instances to OTel Collector");
        }

        for job in &jobs {
            if let Err(e) = self
                .transport
                .send(&job.endpoint, &job.payload, job.kind, counters)
                .await
            {
                error!(kind = %job.kind, line = job.line_number, error = %e, "Failed to send {}", job.kind);
            }
        }

        Ok(DispatchReport {
            records,
            jobs: jobs.len(),
        })
    }
}

/// Sends every matching record through a pool of concurrent workers
pub struct FanOut {
    endpoints: Endpoints,
    transport: Arc<HttpTransport>,
    workers: usize,
}

impl FanOut {
    pub fn new(endpoints: Endpoints, transport: Arc<HttpTransport>, workers: usize) -> Self {
        Self {
            endpoints,
            transport,
            workers,
        }
    }
}

#[async_trait]
impl DispatchStrategy for FanOut {
    fn mode(&self) -> &'static str {
        "send-all"
    }

    async fn dispatch(
        &self,
        name: &str,
        scanner: &mut LineScanner,
        counters: &Arc<OutcomeCounters>,
    ) -> Result<DispatchReport> {
        let pool = SenderPool::start(self.workers, Arc::clone(&self.transport), Arc::clone(counters));
        let mut report = DispatchReport::default();
        let mut outcome = Ok(());

        'scan: loop {
            let (line_number, line) = match scanner.next_line().await {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(source) => {
                    outcome = Err(IngestError::ReadFailed {
                        name: name.to_string(),
                        source,
                    });
                    break;
                }
            };

            let record = match parse_line(line, line_number) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    error!(line = line_number, error = %e, "Error parsing line");
                    continue;
                }
            };
            report.records += 1;

            for kind in classify(&record).iter() {
                let Some(job) =
                    SendJob::from_record(&record, kind, self.endpoints.for_kind(kind), line_number)
                else {
                    continue;
                };

                if let Err(e) = pool.submit(job).await {
                    outcome = Err(e);
                    break 'scan;
                }
                report.jobs += 1;
            }
        }

        info!(total_lines = report.records, jobs = report.jobs, "Finished reading file");
        info!("Waiting for workers to finish");
        let drained = pool.shutdown().await;

        outcome?;
        drained?;
        Ok(report)
    }
}
