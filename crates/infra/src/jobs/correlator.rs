//! Turns unit outcomes into terminal job states.

use lithos_core::{JobId, JobState};
use tokio::task::JoinHandle;

use super::executor::{UnitFailure, UnitHandle, UnitOutcome};
use super::lifecycle::JobLifecycleManager;
use super::store::JobStore;

/// Observes each unit once and records DONE or ERROR for its job.
#[derive(Debug, Clone)]
pub struct CompletionCorrelator<S> {
    jobs: JobLifecycleManager<S>,
}

impl<S> CompletionCorrelator<S>
where
    S: JobStore + Clone + 'static,
{
    pub fn new(jobs: JobLifecycleManager<S>) -> Self {
        Self { jobs }
    }

    /// Spawn the single observer for `handle`.
    ///
    /// The handle is consumed, so each unit is observed at most once.
    pub fn observe(&self, handle: UnitHandle) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = handle.outcome().await;
            this.on_complete(outcome);
        })
    }

    pub fn on_complete(&self, outcome: UnitOutcome) {
        match outcome {
            Ok(job_id) => self.finish(job_id, JobState::Done),
            Err(UnitFailure::Correlated(failure)) => {
                tracing::error!(
                    job_id = %failure.job_id,
                    error = %failure.cause,
                    "job failed"
                );
                self.finish(failure.job_id, JobState::Error);
            }
            Err(UnitFailure::Unexpected(reason)) => {
                tracing::error!(error = %reason, "unexpected failure, job state left unchanged");
            }
        }
    }

    fn finish(&self, job_id: JobId, state: JobState) {
        match self.jobs.update_job_state(job_id, state) {
            Ok(job) => tracing::info!(
                job_id = %job.id,
                kind = %job.kind,
                state = %job.state,
                "job completed"
            ),
            Err(e) => tracing::error!(
                job_id = %job_id,
                error = %e,
                "could not record job completion"
            ),
        }
    }
}
