use super::errors::RaccoonError;
use super::models::{ScanJob, ScanType};
use super::scanner::Scanner;
use super::state::RunState;
use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// `None` when the job never started.
type Outcome = Option<Result<RunState, RaccoonError>>;

#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub index: usize,
    pub target: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<JobFailure>,
}

/// Schedule file entry, e.g. `{ type: normal, target: 10.0.0.1, delay_secs: 30 }`.
#[derive(Debug, Deserialize)]
struct JobEntry {
    #[serde(rename = "type", alias = "scan_type")]
    scan_type: ScanType,
    target: String,
    #[serde(default)]
    delay_secs: u64,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

impl From<JobEntry> for ScanJob {
    fn from(entry: JobEntry) -> Self {
        Self {
            scan_type: entry.scan_type,
            target: entry.target,
            output_dir: entry.output_dir,
            delay: Duration::from_secs(entry.delay_secs),
        }
    }
}

/// Read a YAML list of jobs.
pub fn load_jobs(path: &Path) -> Result<Vec<ScanJob>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule file: {:?}", path))?;
    let entries: Vec<JobEntry> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse schedule file: {:?}", path))?;
    Ok(entries.into_iter().map(ScanJob::from).collect())
}

/// Runs a batch of jobs. One job failing never stops the rest.
pub struct Scheduler {
    scanner: Arc<Scanner>,
    max_parallel: usize,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
    progress: ProgressBar,
}

impl Scheduler {
    pub fn new(scanner: Arc<Scanner>, cancel: CancellationToken) -> Self {
        Self {
            scanner,
            max_parallel: 1,
            job_timeout: None,
            cancel,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn schedule(&self, jobs: Vec<ScanJob>) -> BatchSummary {
        tracing::info!(
            "Scheduling {} scans ({} at a time)",
            jobs.len(),
            self.max_parallel
        );
        self.progress.set_length(jobs.len() as u64);

        let outcomes = if self.max_parallel == 1 {
            self.run_sequential(jobs).await
        } else {
            self.run_parallel(jobs).await
        };

        self.progress.finish_and_clear();
        summarize(outcomes)
    }

    async fn run_sequential(&self, jobs: Vec<ScanJob>) -> Vec<(ScanJob, Outcome)> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            let outcome = run_job(&self.scanner, &job, self.job_timeout, &self.cancel).await;
            self.progress.inc(1);
            outcomes.push((job, outcome));
        }
        outcomes
    }

    async fn run_parallel(&self, jobs: Vec<ScanJob>) -> Vec<(ScanJob, Outcome)> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = Vec::with_capacity(jobs.len());

        for job in jobs {
            let scanner = Arc::clone(&self.scanner);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let progress = self.progress.clone();
            let timeout = self.job_timeout;

            tasks.push(tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_job(&scanner, &job, timeout, &cancel).await,
                    Err(_) => Some(Err(RaccoonError::Cancelled)),
                };
                progress.inc(1);
                (job, outcome)
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for joined in join_all(tasks).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("Scheduled scan task panicked: {}", e),
            }
        }
        outcomes
    }
}

/// Sleep the job's delay, then dispatch. `None` means the job never started
/// because the batch was cancelled.
async fn run_job(
    scanner: &Scanner,
    job: &ScanJob,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Outcome {
    if !job.delay.is_zero() {
        tracing::info!("Waiting {:?} before scanning {}", job.delay, job.target);
        tokio::select! {
            _ = tokio::time::sleep(job.delay) => {}
            _ = cancel.cancelled() => return None,
        }
    }
    if cancel.is_cancelled() {
        return None;
    }

    let scan = scanner.run_scan(job.scan_type, &job.target, job.output_dir.as_deref());
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, scan).await {
            Ok(result) => result,
            Err(_) => Err(RaccoonError::Timeout {
                target: job.target.clone(),
                secs: limit.as_secs(),
            }),
        },
        None => scan.await,
    };
    Some(result)
}

fn summarize(outcomes: Vec<(ScanJob, Outcome)>) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (index, (job, outcome)) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(Ok(state)) => {
                summary.attempted += 1;
                summary.succeeded += 1;
                tracing::info!("Scheduled scan {} on {} complete", state.scan_id, job.target);
            }
            Some(Err(e)) => {
                summary.attempted += 1;
                tracing::error!("Error in scheduled scan of {}: {}", job.target, e);
                summary.failures.push(JobFailure {
                    index,
                    target: job.target,
                    error: e.to_string(),
                });
            }
            None => {
                tracing::warn!("Scheduled scan of {} cancelled before it started", job.target);
                summary.failures.push(JobFailure {
                    index,
                    target: job.target,
                    error: RaccoonError::Cancelled.to_string(),
                });
            }
        }
    }
    summary
}
