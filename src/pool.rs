//! Bounded pool of concurrent senders

use crate::errors::{IngestError, Result};
use crate::stats::OutcomeCounters;
use crate::telemetry::SendJob;
use crate::transport::HttpTransport;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Fixed set of workers draining a bounded job queue.
///
/// Every submitted job is handed to exactly one worker, which calls the
/// transport once and records the outcome. `shutdown` closes the queue and
/// waits for all workers to finish what is already queued.
pub struct SenderPool {
    sender: mpsc::Sender<SendJob>,
    handles: Vec<JoinHandle<()>>,
}

impl SenderPool {
    /// Spawn `workers` senders over a queue holding up to `2 * workers` jobs
    pub fn start(workers: usize, transport: Arc<HttpTransport>, counters: Arc<OutcomeCounters>) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel(workers * 2);
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (1..=workers)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&receiver),
                    Arc::clone(&transport),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        debug!(workers, "Started sender pool");
        Self { sender, handles }
    }

    /// Queue a job, waiting while the queue is full
    pub async fn submit(&self, job: SendJob) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| IngestError::WorkerPool("job queue closed, all workers exited".to_string()))
    }

    /// Close the queue and wait for every worker to drain it
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);

        let mut panicked = 0;
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!("Sender worker terminated abnormally: {}", e);
                panicked += 1;
            }
        }

        if panicked > 0 {
            return Err(IngestError::WorkerPool(format!("{} worker(s) panicked", panicked)));
        }
        Ok(())
    }
}

async fn worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<SendJob>>>,
    transport: Arc<HttpTransport>,
    counters: Arc<OutcomeCounters>,
) {
    loop {
        // Lock only while waiting for the next job
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else { break };

        if let Err(e) = transport
            .send(&job.endpoint, &job.payload, job.kind, &counters)
            .await
        {
            error!(
                worker = id,
                kind = %job.kind,
                line = job.line_number,
                error = %e,
                "Worker failed to send telemetry"
            );
        }
    }
    debug!(worker = id, "Sender worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryKind;
    use serde_json::{json, Map, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job(endpoint: &str, kind: TelemetryKind, line_number: usize) -> SendJob {
        let mut payload = Map::new();
        payload.insert(kind.field().to_string(), json!([{"line": line_number}]));
        SendJob {
            endpoint: endpoint.to_string(),
            payload,
            kind,
            line_number,
        }
    }

    fn transport() -> Arc<HttpTransport> {
        Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_every_job_sent_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/traces"))
            .respond_with(ResponseTemplate::new(200))
            .expect(25)
            .mount(&server)
            .await;

        let counters = Arc::new(OutcomeCounters::new());
        let pool = SenderPool::start(4, transport(), Arc::clone(&counters));
        let endpoint = format!("{}/v1/traces", server.uri());

        for line in 1..=25 {
            pool.submit(job(&endpoint, TelemetryKind::Traces, line)).await.unwrap();
        }
        pool.shutdown().await.unwrap();

        assert_eq!(counters.summarize().traces.success, 25);

        let mut lines: Vec<u64> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|req| {
                let body: Value = req.body_json().unwrap();
                body["resourceSpans"][0]["line"].as_u64().unwrap()
            })
            .collect();
        lines.sort_unstable();
        assert_eq!(lines, (1..=25).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_workers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/logs"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead = format!("http://{}/v1/metrics", listener.local_addr().unwrap());
        drop(listener);

        let counters = Arc::new(OutcomeCounters::new());
        let pool = SenderPool::start(2, transport(), Arc::clone(&counters));
        let logs = format!("{}/v1/logs", server.uri());

        for line in 1..=6 {
            pool.submit(job(&dead, TelemetryKind::Metrics, line)).await.unwrap();
            pool.submit(job(&logs, TelemetryKind::Logs, line)).await.unwrap();
        }
        pool.shutdown().await.unwrap();

        let summary = counters.summarize();
        assert_eq!(summary.metrics.failed, 6);
        assert_eq!(summary.metrics.success, 0);
        assert_eq!(summary.logs.success, 6);
    }

    #[tokio::test]
    async fn test_shutdown_with_no_jobs() {
        let counters = Arc::new(OutcomeCounters::new());
        let pool = SenderPool::start(3, transport(), Arc::clone(&counters));
        pool.shutdown().await.unwrap();
        assert_eq!(counters.summarize().total_attempts(), 0);
    }
}
