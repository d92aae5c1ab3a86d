use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::ScanSettings,
    error::ScanError,
    job::{ScanJob, ScanParams},
    runner,
    types::{JobSnapshot, ProbeResult},
};

/// In-memory table of scan jobs shared by the HTTP handlers and the runners.
///
/// A single `RwLock` guards the whole table: a runner appends a result (and
/// thereby advances progress) under the write lock, and pollers copy a snapshot
/// under the read lock, so no reader ever sees a half-applied update.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
    settings: ScanSettings,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

#[derive(Debug)]
struct JobEntry {
    job: ScanJob,
    cancel: CancellationToken, // child of the registry's shutdown token
}

impl JobRegistry {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            settings,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn settings(&self) -> ScanSettings {
        self.settings
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Validate the request and insert a fresh job with no results. Does not start probing.
    pub async fn create(&self, host: &str, start_port: i64, end_port: i64) -> Result<String, ScanError> {
        let params = ScanParams::validate(host, start_port, end_port)?;
        let (id, _cancel) = self.insert(params).await?;
        Ok(id)
    }

    /// Create a job and launch its runner in the background. Returns as soon as
    /// the job is registered.
    pub async fn start_scan(
        self: &Arc<Self>,
        host: &str,
        start_port: i64,
        end_port: i64,
    ) -> Result<String, ScanError> {
        let params = ScanParams::validate(host, start_port, end_port)?;
        let (id, cancel) = self.insert(params.clone()).await?;
        self.tasks.spawn(runner::run_job(
            Arc::clone(self),
            id.clone(),
            params,
            cancel,
        ));
        Ok(id)
    }

    async fn insert(&self, params: ScanParams) -> Result<(String, CancellationToken), ScanError> {
        if self.is_shutting_down() {
            return Err(ScanError::ShuttingDown);
        }
        let id = Uuid::new_v4().to_string();
        let cancel = self.shutdown.child_token();
        info!(
            scan_id = %id,
            host = %params.host,
            start_port = params.start_port,
            end_port = params.end_port,
            "scan job created"
        );
        let entry = JobEntry {
            job: ScanJob::new(id.clone(), params),
            cancel: cancel.clone(),
        };
        self.jobs.write().await.insert(id.clone(), entry);
        Ok((id, cancel))
    }

    pub async fn get(&self, id: &str) -> Result<JobSnapshot, ScanError> {
        let jobs = self.jobs.read().await;
        jobs.get(id)
            .map(|e| e.job.snapshot())
            .ok_or_else(|| ScanError::NotFound(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.jobs.read().await.contains_key(id)
    }

    /// Append a probe result and advance progress as one unit.
    ///
    /// Returns false, without touching anything, when the job is gone, already
    /// completed, or already holds a result for every port in its range.
    pub async fn record_result(&self, id: &str, result: ProbeResult) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(id) else {
            debug!(scan_id = %id, port = result.port, "dropping result for removed job");
            return false;
        };
        if !entry.job.push(result) {
            warn!(scan_id = %id, "refusing result for finished job");
            return false;
        }
        true
    }

    /// Mark the job completed. Idempotent; returns false only if the job no longer exists.
    pub async fn mark_completed(&self, id: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(entry) => {
                entry.job.complete();
                true
            }
            None => false,
        }
    }

    /// Drop a job and signal its runner to stop.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.jobs.write().await.remove(id);
        match removed {
            Some(entry) => {
                entry.cancel.cancel();
                info!(scan_id = %id, "scan job removed");
                true
            }
            None => false,
        }
    }

    /// Remove jobs that completed at least `retention` ago. Returns how many were evicted.
    pub async fn evict_completed(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, e| match e.job.completed_at() {
            Some(at) => now.saturating_duration_since(at) < retention,
            None => true,
        });
        before - jobs.len()
    }

    /// Periodically evict expired jobs until shutdown. A zero period is raised to 1 ms.
    pub fn spawn_sweeper(self: &Arc<Self>, retention: Duration, every: Duration) {
        let registry = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        let every = every.max(Duration::from_millis(1));
        self.tasks.spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.evict_completed(retention).await;
                        if evicted > 0 {
                            info!(evicted, "evicted expired scan jobs");
                        }
                    }
                }
            }
        });
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Refuse new jobs, cancel every runner and wait for all background tasks to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("scan registry stopped");
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(ScanSettings::default())
    }
}
