//! Worker pool - one crawl per root URL, `workers` at a time
//!
//! Each root is crawled by an isolated worker. The default launcher
//! re-invokes the current executable so every root runs in its own OS
//! process and talks to its siblings only through the landing zone. The
//! in-process launcher runs the coordinator on a tokio task instead.
//!
//! A worker that fails, exits non-zero or panics is reported for its root
//! and never aborts the others.

use crate::crawler::coordinator::{Coordinator, CrawlSummary};
use crate::CrawlError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Hidden command-line flag that turns the binary into a single-root worker
pub const WORKER_ROOT_FLAG: &str = "--worker-root";

/// How a root crawl is started
pub enum Launcher {
    /// Spawn `program <config> --worker-root <url>` and read its summary
    /// from the last line of stdout
    Process {
        program: PathBuf,
        config_path: PathBuf,
        resume: bool,
        verbose: u8,
        quiet: bool,
    },

    /// Run the crawl on a tokio task in this process
    InProcess(Arc<Coordinator>),
}

impl Launcher {
    /// A process launcher re-invoking the running executable
    pub fn current_exe(
        config_path: PathBuf,
        resume: bool,
        verbose: u8,
        quiet: bool,
    ) -> Result<Self, CrawlError> {
        Ok(Self::Process {
            program: std::env::current_exe()?,
            config_path,
            resume,
            verbose,
            quiet,
        })
    }

    async fn run(&self, root_url: &str) -> Result<CrawlSummary, CrawlError> {
        match self {
            Self::InProcess(coordinator) => coordinator.crawl(root_url).await,
            Self::Process {
                program,
                config_path,
                resume,
                verbose,
                quiet,
            } => {
                let mut command = tokio::process::Command::new(program);
                command
                    .args(worker_args(config_path, root_url, *resume, *verbose, *quiet))
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .kill_on_drop(true);

                let output = command.output().await?;
                if !output.status.success() {
                    return Err(CrawlError::Worker {
                        root_url: root_url.to_string(),
                        message: format!("worker exited with {}", output.status),
                    });
                }

                parse_worker_output(root_url, &output.stdout)
            }
        }
    }
}

/// Command line for a worker process crawling `root_url`
fn worker_args(
    config_path: &Path,
    root_url: &str,
    resume: bool,
    verbose: u8,
    quiet: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        config_path.into(),
        WORKER_ROOT_FLAG.into(),
        root_url.into(),
        OsString::from(if resume { "--resume" } else { "--fresh" }),
    ];
    if quiet {
        args.push("--quiet".into());
    } else if verbose > 0 {
        args.push(format!("-{}", "v".repeat(verbose as usize)).into());
    }
    args
}

/// Reads the summary line a worker process prints on exit
fn parse_worker_output(root_url: &str, stdout: &[u8]) -> Result<CrawlSummary, CrawlError> {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| CrawlError::Worker {
            root_url: root_url.to_string(),
            message: "worker printed no summary".to_string(),
        })?;

    Ok(serde_json::from_str(line.trim())?)
}

/// Final state of one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootOutcome {
    Completed(CrawlSummary),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    pub root_url: String,
    pub outcome: RootOutcome,
}

/// Per-root outcomes, in the order the roots were given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub roots: Vec<RootReport>,
}

impl PoolReport {
    pub fn completed(&self) -> usize {
        self.summaries().count()
    }

    pub fn failed(&self) -> usize {
        self.roots.len() - self.completed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn summaries(&self) -> impl Iterator<Item = &CrawlSummary> {
        self.roots.iter().filter_map(|r| match &r.outcome {
            RootOutcome::Completed(summary) => Some(summary),
            RootOutcome::Failed { .. } => None,
        })
    }
}

/// Bounded pool of root crawls
pub struct WorkerPool {
    workers: usize,
    launcher: Arc<Launcher>,
}

impl WorkerPool {
    /// Creates a pool running at most `workers` roots at once (minimum 1)
    pub fn new(workers: usize, launcher: Launcher) -> Self {
        Self {
            workers: workers.max(1),
            launcher: Arc::new(launcher),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Crawls every root and waits until all of them have settled
    ///
    /// A new root is started only when a slot is free, so at most
    /// `workers` crawls are ever in flight.
    pub async fn crawl_many(&self, root_urls: &[String]) -> PoolReport {
        let slots = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(root_urls.len());

        for root_url in root_urls {
            let permit = match slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Worker pool closed before {} started: {}", root_url, e);
                    break;
                }
            };

            tracing::info!("Starting worker for {}", root_url);
            let launcher = self.launcher.clone();
            let root = root_url.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                launcher.run(&root).await
            });
            handles.push((root_url.clone(), handle));
        }

        let mut report = PoolReport::default();
        for (root_url, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(summary)) => {
                    tracing::info!(
                        "Worker {} finished {}: {} fetched",
                        summary.worker_id,
                        root_url,
                        summary.visited
                    );
                    RootOutcome::Completed(summary)
                }
                Ok(Err(e)) => {
                    tracing::error!("Worker for {} failed: {}", root_url, e);
                    RootOutcome::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => {
                    let error = if e.is_panic() {
                        "worker panicked".to_string()
                    } else {
                        format!("worker task cancelled: {}", e)
                    };
                    tracing::error!("Worker for {} failed: {}", root_url, error);
                    RootOutcome::Failed { error }
                }
            };
            report.roots.push(RootReport { root_url, outcome });
        }

        report
    }
}
