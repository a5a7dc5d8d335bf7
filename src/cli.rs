//! Command-line interface

use crate::config::{
    Config, Endpoints, DEFAULT_FILE_PATTERN, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_BUFFER_CAPACITY,
    DEFAULT_OTEL_LOGS_ENDPOINT, DEFAULT_OTEL_METRICS_ENDPOINT, DEFAULT_OTEL_TRACES_ENDPOINT,
    DEFAULT_WORKERS,
};
use crate::errors::Result;
use crate::ingest::Ingestor;
use crate::sources::ingest_folder;
use crate::stats::OutcomeCounters;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Reads OTLP format telemetry data from JSON Lines files and sends it to an
/// OpenTelemetry Collector. By default only the last instance of each
/// telemetry type (traces, logs, metrics) is sent.
#[derive(Debug, Parser)]
#[command(name = "ingest_telemetry", version, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Telemetry file to ingest (overrides --file)
    pub path: Option<PathBuf>,

    /// Path to telemetry JSON file
    #[arg(short, long, default_value = "telemetry.json", env = "TELEMETRY_FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub options: PipelineArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest telemetry data from all files in a folder, including zip archives
    Folder(FolderArgs),
}

#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder to ingest (overrides --folder)
    pub path: Option<PathBuf>,

    /// Path to folder containing telemetry JSON files
    #[arg(short = 'd', long = "folder", default_value = ".", env = "TELEMETRY_FOLDER")]
    pub folder: PathBuf,

    /// File pattern to match (e.g. *.json, telemetry_*.jsonl)
    #[arg(long, default_value = DEFAULT_FILE_PATTERN, env = "TELEMETRY_FILE_PATTERN")]
    pub pattern: String,

    #[command(flatten)]
    pub options: PipelineArgs,
}

/// Flags shared by single-file and folder ingestion
#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// OpenTelemetry traces endpoint
    #[arg(long, default_value = DEFAULT_OTEL_TRACES_ENDPOINT, env = "OTEL_TRACES_ENDPOINT")]
    pub traces_endpoint: String,

    /// OpenTelemetry logs endpoint
    #[arg(long, default_value = DEFAULT_OTEL_LOGS_ENDPOINT, env = "OTEL_LOGS_ENDPOINT")]
    pub logs_endpoint: String,

    /// OpenTelemetry metrics endpoint
    #[arg(long, default_value = DEFAULT_OTEL_METRICS_ENDPOINT, env = "OTEL_METRICS_ENDPOINT")]
    pub metrics_endpoint: String,

    /// Maximum buffer capacity in bytes for reading lines
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER_CAPACITY, env = "INGEST_MAX_BUFFER_CAPACITY")]
    pub max_buffer_capacity: usize,

    /// Send all telemetry lines instead of only the last instance of each type
    #[arg(long, alias = "sendAll", env = "INGEST_SEND_ALL")]
    pub send_all: bool,

    /// Number of concurrent workers for sending telemetry (only used with --send-all)
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "INGEST_WORKERS")]
    pub workers: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS, env = "HTTP_TIMEOUT_SECONDS")]
    pub http_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "INGEST_LOG_LEVEL")]
    pub log_level: String,
}

impl PipelineArgs {
    fn apply(&self, config: &mut Config) {
        config.endpoints = Endpoints {
            traces: self.traces_endpoint.clone(),
            logs: self.logs_endpoint.clone(),
            metrics: self.metrics_endpoint.clone(),
        };
        config.max_buffer_capacity = self.max_buffer_capacity;
        config.send_all = self.send_all;
        config.workers = self.workers;
        config.http_timeout = Duration::from_secs(self.http_timeout_secs);
    }
}

impl Cli {
    /// Log level requested by whichever command is running
    pub fn log_level(&self) -> &str {
        match &self.command {
            Some(Command::Folder(args)) => &args.options.log_level,
            None => &self.options.log_level,
        }
    }

    /// Build the runtime configuration from parsed arguments
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        match &self.command {
            Some(Command::Folder(args)) => {
                args.options.apply(&mut config);
                config.file_path = args.path.clone().unwrap_or_else(|| args.folder.clone());
                config.file_pattern = args.pattern.clone();
            }
            None => {
                self.options.apply(&mut config);
                config.file_path = self.path.clone().unwrap_or_else(|| self.file.clone());
            }
        }
        config
    }

    /// Run the selected command to completion
    pub async fn run(self) -> Result<()> {
        let config = self.to_config();
        let path = config.file_path.clone();
        let ingestor = Ingestor::new(config)?;

        match self.command {
            Some(Command::Folder(_)) => {
                ingest_folder(&ingestor, &path).await?;
            }
            None => {
                let counters = Arc::new(OutcomeCounters::new());
                let result = ingestor.ingest_file(&path, &counters).await;
                counters.summarize().log();
                result?;
            }
        }
        Ok(())
    }
}
