//! Job storage implementations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lithos_core::{Entity, Job, JobId};

/// Job store abstraction.
///
/// A keyed registry of jobs. Implementations must be safe to share between the
/// request path (creation, status queries) and completion observers.
pub trait JobStore: Send + Sync {
    /// Persist a new job.
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError>;

    /// Get a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Overwrite an existing job.
    fn update(&self, job: &Job) -> Result<(), JobStoreError>;

    /// All jobs, oldest first.
    fn list(&self) -> Result<Vec<Job>, JobStoreError>;
}

impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        (**self).insert(job)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        (**self).list()
    }
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, JobStoreError> {
    lock.read()
        .map_err(|_| JobStoreError::Storage("job store lock poisoned".to_string()))
}

fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, JobStoreError> {
    lock.write()
        .map_err(|_| JobStoreError::Storage("job store lock poisoned".to_string()))
}

fn insert_into(jobs: &mut HashMap<JobId, Job>, job: Job) -> Result<JobId, JobStoreError> {
    let id = *job.id();
    if jobs.contains_key(&id) {
        return Err(JobStoreError::AlreadyExists(id));
    }
    jobs.insert(id, job);
    Ok(id)
}

fn update_in(jobs: &mut HashMap<JobId, Job>, job: &Job) -> Result<(), JobStoreError> {
    match jobs.get_mut(job.id()) {
        Some(slot) => {
            *slot = job.clone();
            Ok(())
        }
        None => Err(JobStoreError::NotFound(*job.id())),
    }
}

fn sorted(jobs: &HashMap<JobId, Job>) -> Vec<Job> {
    let mut all: Vec<_> = jobs.values().cloned().collect();
    all.sort_by_key(|j| j.created_at);
    all
}

/// In-memory job store for tests/dev.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        insert_into(&mut *write_lock(&self.jobs)?, job)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(read_lock(&self.jobs)?.get(&job_id).cloned())
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        update_in(&mut *write_lock(&self.jobs)?, job)
    }

    fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        Ok(sorted(&*read_lock(&self.jobs)?))
    }
}

/// Job store snapshotted to a JSON file.
///
/// Every mutation rewrites the whole snapshot (write to a sibling temp file,
/// then rename), so job state survives a restart. Reads are served from memory.
#[derive(Debug)]
pub struct FileJobStore {
    path: PathBuf,
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl FileJobStore {
    /// Open (or create) a snapshot at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JobStoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage(&path, e))?;
        }

        let jobs = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| storage(&path, e))?;
            let list: Vec<Job> = serde_json::from_slice(&bytes)
                .map_err(|e| JobStoreError::Storage(format!("{}: {e}", path.display())))?;
            list.into_iter().map(|j| (j.id, j)).collect()
        } else {
            HashMap::new()
        };

        tracing::info!(path = %path.display(), jobs = jobs.len(), "job store opened");
        Ok(Self {
            path,
            jobs: RwLock::new(jobs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, jobs: &HashMap<JobId, Job>) -> Result<(), JobStoreError> {
        let bytes = serde_json::to_vec_pretty(&sorted(jobs))
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| storage(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage(&self.path, e))
    }
}

fn storage(path: &Path, err: std::io::Error) -> JobStoreError {
    JobStoreError::Storage(format!("{}: {err}", path.display()))
}

impl JobStore for FileJobStore {
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        let mut jobs = write_lock(&self.jobs)?;
        let id = insert_into(&mut jobs, job)?;
        if let Err(e) = self.persist(&jobs) {
            jobs.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(read_lock(&self.jobs)?.get(&job_id).cloned())
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = write_lock(&self.jobs)?;
        let previous = jobs
            .get(&job.id)
            .cloned()
            .ok_or(JobStoreError::NotFound(job.id))?;
        update_in(&mut jobs, job)?;
        if let Err(e) = self.persist(&jobs) {
            jobs.insert(previous.id, previous);
            return Err(e);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        Ok(sorted(&*read_lock(&self.jobs)?))
    }
}
