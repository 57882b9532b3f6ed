//! Job creation, status queries and state updates.

use std::path::PathBuf;

use lithos_core::{DomainError, Job, JobId, JobKind, JobState};

use super::store::{JobStore, JobStoreError};

/// Errors surfaced by the lifecycle manager and the artifact gate.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {0} is still in progress")]
    InProgress(JobId),
    #[error(transparent)]
    Invariant(#[from] DomainError),
    #[error(transparent)]
    Store(JobStoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JobStoreError> for JobError {
    fn from(err: JobStoreError) -> Self {
        match err {
            JobStoreError::NotFound(id) => JobError::NotFound(id),
            other => JobError::Store(other),
        }
    }
}

/// Creates jobs and answers status queries against a [`JobStore`].
#[derive(Debug, Clone)]
pub struct JobLifecycleManager<S> {
    store: S,
    export_dir: PathBuf,
}

impl<S: JobStore> JobLifecycleManager<S> {
    pub fn new(store: S, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: export_dir.into(),
        }
    }

    /// Create and persist a new `IN_PROGRESS` job.
    ///
    /// Export jobs get their artifact path up front; the file is created empty
    /// so a concurrent fetch never races a missing path.
    pub async fn create_job(&self, kind: JobKind) -> Result<Job, JobError> {
        let mut job = Job::new(kind);
        if kind == JobKind::Export {
            tokio::fs::create_dir_all(&self.export_dir).await?;
            let path = self.export_dir.join(format!("export_{}.xls", job.id));
            tokio::fs::File::create(&path).await?;
            job = job.with_resource_path(path);
        }

        self.store.insert(job.clone())?;
        tracing::info!(job_id = %job.id, kind = %job.kind, "job created");
        Ok(job)
    }

    /// Look up a job, treating a kind mismatch as absent.
    pub fn get_job(&self, id: JobId, kind: JobKind) -> Result<Job, JobError> {
        match self.store.get(id)? {
            Some(job) if job.kind == kind => Ok(job),
            _ => Err(JobError::NotFound(id)),
        }
    }

    pub fn get_job_state(&self, id: JobId, kind: JobKind) -> Result<JobState, JobError> {
        self.get_job(id, kind).map(|job| job.state)
    }

    /// Move a job into its terminal state and persist it.
    pub fn update_job_state(&self, id: JobId, state: JobState) -> Result<Job, JobError> {
        let mut job = self.store.get(id)?.ok_or(JobError::NotFound(id))?;
        job.transition(state)?;
        self.store.update(&job)?;
        Ok(job)
    }
}
