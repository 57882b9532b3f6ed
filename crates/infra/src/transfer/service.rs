use std::path::PathBuf;
use std::sync::Arc;

use lithos_core::{Job, JobId, JobKind, JobState};

use super::artifact::{ExportArtifact, fetch_export_artifact};
use super::export::run_export;
use super::import::run_import;
use crate::jobs::{
    CompletionCorrelator, JobError, JobLifecycleManager, JobStore, WorkerPool, WorkerPoolConfig,
};
use crate::sections::SectionStore;

/// Starts import/export jobs and answers queries about them.
///
/// Every started job gets exactly one unit on the worker pool and exactly one
/// completion observer.
#[derive(Clone)]
pub struct TransferService<S> {
    jobs: JobLifecycleManager<S>,
    sections: Arc<dyn SectionStore>,
    pool: WorkerPool,
    correlator: CompletionCorrelator<S>,
}

impl<S> std::fmt::Debug for TransferService<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferService")
            .field("jobs", &self.jobs)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl<S> TransferService<S>
where
    S: JobStore + Clone + 'static,
{
    pub fn new(
        jobs: JobLifecycleManager<S>,
        sections: Arc<dyn SectionStore>,
        pool: WorkerPoolConfig,
    ) -> Self {
        Self {
            correlator: CompletionCorrelator::new(jobs.clone()),
            jobs,
            sections,
            pool: WorkerPool::new(pool),
        }
    }

    /// Create an export job and queue its unit.
    pub async fn start_export(&self) -> Result<Job, JobError> {
        let job = self.jobs.create_job(JobKind::Export).await?;
        let destination = job
            .resource_path()
            .map(|p| p.to_path_buf())
            .ok_or(JobError::NotFound(job.id))?;

        let sections = self.sections.clone();
        let id = job.id;
        let handle = self.pool.submit(id, async move {
            run_export(sections.as_ref(), id, &destination).await
        });
        self.correlator.observe(handle);
        Ok(job)
    }

    /// Create an import job for an already staged upload and queue its unit.
    ///
    /// The staged file is owned by the unit from here on. If the job cannot be
    /// created the file is removed immediately.
    pub async fn start_import(&self, staged: PathBuf) -> Result<Job, JobError> {
        let job = match self.jobs.create_job(JobKind::Import).await {
            Ok(job) => job,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&staged).await {
                    tracing::warn!(path = %staged.display(), error = %rm, "could not delete staged upload");
                }
                return Err(e);
            }
        };

        let sections = self.sections.clone();
        let id = job.id;
        let handle = self.pool.submit(id, async move {
            run_import(sections.as_ref(), id, &staged).await
        });
        self.correlator.observe(handle);
        Ok(job)
    }

    pub fn export_state(&self, id: JobId) -> Result<JobState, JobError> {
        self.jobs.get_job_state(id, JobKind::Export)
    }

    pub fn import_state(&self, id: JobId) -> Result<JobState, JobError> {
        self.jobs.get_job_state(id, JobKind::Import)
    }

    pub async fn export_artifact(&self, id: JobId) -> Result<ExportArtifact, JobError> {
        fetch_export_artifact(&self.jobs, id).await
    }
}
