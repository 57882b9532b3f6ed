//! Infrastructure wiring: job store, section store, staging, transfer service.

use std::sync::Arc;

use lithos_infra::StagingArea;
use lithos_infra::jobs::{
    FileJobStore, InMemoryJobStore, JobLifecycleManager, JobStore, JobStoreError,
    WorkerPoolConfig,
};
use lithos_infra::sections::{InMemorySectionStore, SectionStore, SectionStoreError, seed_if_empty};
use lithos_infra::transfer::TransferService;

use crate::config::AppConfig;

/// Failure while wiring services at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("job store: {0}")]
    JobStore(#[from] JobStoreError),
    #[error("seeding sections: {0}")]
    Seed(#[from] SectionStoreError),
}

/// Job store selected at startup.
pub type SharedJobStore = Arc<dyn JobStore>;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub transfer: TransferService<SharedJobStore>,
    pub sections: Arc<dyn SectionStore>,
    pub staging: StagingArea,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("staging", &self.staging)
            .finish_non_exhaustive()
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let job_store: SharedJobStore = match &config.job_store_path {
        Some(path) => Arc::new(FileJobStore::open(path)?),
        None => {
            tracing::info!("using in-memory job store");
            Arc::new(InMemoryJobStore::new())
        }
    };
    warn_unfinished_jobs(job_store.as_ref())?;

    let sections: Arc<dyn SectionStore> = Arc::new(InMemorySectionStore::new());
    if config.seed_sample_data {
        seed_if_empty(sections.as_ref()).await?;
    }

    let jobs = JobLifecycleManager::new(job_store, &config.export_dir);
    let transfer = TransferService::new(
        jobs,
        sections.clone(),
        WorkerPoolConfig::default().with_max_concurrent(config.max_concurrent_jobs),
    );

    Ok(AppServices {
        transfer,
        sections,
        staging: StagingArea::new(&config.staging_dir),
    })
}

/// Jobs reloaded in IN_PROGRESS belong to a previous process and will not
/// complete.
fn warn_unfinished_jobs(store: &dyn JobStore) -> Result<(), JobStoreError> {
    let unfinished = store
        .list()?
        .iter()
        .filter(|job| !job.state.is_terminal())
        .count();
    if unfinished > 0 {
        tracing::warn!(unfinished, "jobs from a previous run are still IN_PROGRESS");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path, seed: bool) -> AppConfig {
        AppConfig {
            export_dir: dir.join("exports"),
            staging_dir: dir.join("staging"),
            seed_sample_data: seed,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn sample_sections_are_seeded_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let services = build_services(&config(dir.path(), true)).await.unwrap();
        let names: Vec<_> = services
            .sections
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.record.name)
            .collect();
        assert_eq!(names, vec!["Init Section 1", "Init Section 2"]);
    }

    #[tokio::test]
    async fn seeding_can_be_turned_off() {
        let dir = tempfile::tempdir().unwrap();
        let services = build_services(&config(dir.path(), false)).await.unwrap();
        assert!(services.sections.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reloaded_job_store_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        let job = lithos_core::Job::new(lithos_core::JobKind::Import);
        FileJobStore::open(&path).unwrap().insert(job.clone()).unwrap();

        let services = build_services(&AppConfig {
            job_store_path: Some(path),
            ..config(dir.path(), false)
        })
        .await
        .unwrap();
        assert_eq!(
            services.transfer.import_state(job.id).unwrap(),
            lithos_core::JobState::InProgress
        );
    }
}
