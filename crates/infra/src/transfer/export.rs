use std::path::Path;

use lithos_core::{JobId, SectionRecord};
use lithos_tabular::{encode, write_workbook};

use super::TransferError;
use crate::jobs::{UnitFailure, UnitOutcome};
use crate::sections::SectionStore;

/// Write every stored section to the workbook at `destination`.
pub async fn run_export<R>(store: &R, job_id: JobId, destination: &Path) -> UnitOutcome
where
    R: SectionStore + ?Sized,
{
    let sections = store
        .list()
        .await
        .map_err(|e| UnitFailure::unexpected(format!("listing sections: {e}")))?;
    let records: Vec<SectionRecord> = sections.into_iter().map(|s| s.record).collect();

    let grid = encode(&records);
    let bytes = write_workbook(&grid).map_err(|e| UnitFailure::correlated(job_id, e))?;
    tokio::fs::write(destination, &bytes)
        .await
        .map_err(|e| UnitFailure::correlated(job_id, TransferError::io(destination, e)))?;

    tracing::info!(
        job_id = %job_id,
        rows = records.len(),
        path = %destination.display(),
        "export finished"
    );
    Ok(job_id)
}
