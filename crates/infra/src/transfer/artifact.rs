use lithos_core::{JobId, JobKind, JobState};

use crate::jobs::{JobError, JobLifecycleManager, JobStore};

/// A finished export ready for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Fetch the artifact of an export job.
///
/// DONE and ERROR jobs both return whatever the file holds; an ERROR export may
/// be empty or partial.
pub async fn fetch_export_artifact<S: JobStore>(
    jobs: &JobLifecycleManager<S>,
    id: JobId,
) -> Result<ExportArtifact, JobError> {
    let job = jobs.get_job(id, JobKind::Export)?;
    if job.state == JobState::InProgress {
        tracing::warn!(job_id = %id, "export artifact requested while job in progress");
        return Err(JobError::InProgress(id));
    }

    let path = job.resource_path().ok_or(JobError::NotFound(id))?;
    let bytes = tokio::fs::read(path).await?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Ok(ExportArtifact {
        bytes,
        content_type,
        filename: format!("{id}.xls"),
    })
}
