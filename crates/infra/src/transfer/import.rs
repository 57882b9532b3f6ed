use std::path::Path;

use lithos_core::JobId;
use lithos_tabular::{decode, read_workbook};

use super::TransferError;
use crate::jobs::{UnitFailure, UnitOutcome};
use crate::sections::SectionStore;

/// Import the staged workbook at `source`, saving one section per data row.
///
/// Each row is persisted before the next is parsed, so a failing row leaves
/// the earlier ones saved. The staged file is removed whatever the outcome.
pub async fn run_import<R>(store: &R, job_id: JobId, source: &Path) -> UnitOutcome
where
    R: SectionStore + ?Sized,
{
    let outcome = import_rows(store, job_id, source).await;

    if let Err(e) = tokio::fs::remove_file(source).await {
        tracing::warn!(
            job_id = %job_id,
            path = %source.display(),
            error = %e,
            "could not delete staged upload"
        );
    }

    outcome
}

async fn import_rows<R>(store: &R, job_id: JobId, source: &Path) -> UnitOutcome
where
    R: SectionStore + ?Sized,
{
    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| UnitFailure::correlated(job_id, TransferError::io(source, e)))?;
    let grid = read_workbook(&bytes).map_err(|e| UnitFailure::correlated(job_id, e))?;

    let mut rows = 0usize;
    for record in decode(&grid) {
        let record = record.map_err(|e| UnitFailure::correlated(job_id, e))?;
        store
            .save_imported(record, job_id)
            .await
            .map_err(|e| UnitFailure::unexpected(format!("saving imported section: {e}")))?;
        rows += 1;
    }

    tracing::info!(job_id = %job_id, rows, "import finished");
    Ok(job_id)
}
