//! Bounded worker pool running import/export units off the request path.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use lithos_core::JobId;

use crate::transfer::TransferError;

/// Result of one unit of work: the job id it ran for, or why it failed.
pub type UnitOutcome = Result<JobId, UnitFailure>;

/// A failure that names the job it belongs to.
#[derive(Debug, thiserror::Error)]
#[error("job {job_id} failed: {cause}")]
pub struct JobCorrelatedFailure {
    pub job_id: JobId,
    #[source]
    pub cause: TransferError,
}

impl JobCorrelatedFailure {
    pub fn new(job_id: JobId, cause: impl Into<TransferError>) -> Self {
        Self {
            job_id,
            cause: cause.into(),
        }
    }
}

/// Why a unit did not complete.
///
/// Only `Correlated` failures move a job to `ERROR`; anything else is logged
/// and leaves the job where it was.
#[derive(Debug, thiserror::Error)]
pub enum UnitFailure {
    #[error(transparent)]
    Correlated(#[from] JobCorrelatedFailure),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl UnitFailure {
    pub fn correlated(job_id: JobId, cause: impl Into<TransferError>) -> Self {
        Self::Correlated(JobCorrelatedFailure::new(job_id, cause))
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum units running at once.
    pub max_concurrent: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

impl WorkerPoolConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }
}

/// Runs units as tokio tasks, at most `max_concurrent` at a time.
///
/// Units start in no particular order. There is no cancellation or timeout.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Self {
        let size = config.max_concurrent.max(1);
        tracing::info!(size, "worker pool started");
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue a unit for `job_id`. The returned handle resolves exactly once.
    ///
    /// Must be called inside a tokio runtime.
    pub fn submit<F>(&self, job_id: JobId, unit: F) -> UnitHandle
    where
        F: Future<Output = UnitOutcome> + Send + 'static,
    {
        let permits = self.permits.clone();
        let join = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| UnitFailure::unexpected("worker pool is closed"))?;
            unit.await
        });
        tracing::debug!(job_id = %job_id, "unit submitted");
        UnitHandle { job_id, join }
    }
}

/// Completion handle for a submitted unit.
#[derive(Debug)]
pub struct UnitHandle {
    job_id: JobId,
    join: JoinHandle<UnitOutcome>,
}

impl UnitHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Wait for the unit. A panicking unit is an unexpected failure.
    pub async fn outcome(self) -> UnitOutcome {
        let Self { job_id, join } = self;
        match join.await {
            Ok(outcome) => outcome,
            Err(e) => Err(UnitFailure::unexpected(format!(
                "unit for job {job_id} did not finish: {e}"
            ))),
        }
    }
}
