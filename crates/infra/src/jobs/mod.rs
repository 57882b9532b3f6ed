//! Job tracking and asynchronous execution.
//!
//! ## Components
//!
//! - `JobStore`: keyed registry of jobs (in-memory or JSON snapshot)
//! - `JobLifecycleManager`: creation, status queries, terminal transitions
//! - `WorkerPool`: bounded tokio pool that runs one unit per job
//! - `CompletionCorrelator`: the single observer that moves a job to DONE or ERROR

pub mod correlator;
pub mod executor;
pub mod lifecycle;
pub mod store;

pub use correlator::CompletionCorrelator;
pub use executor::{
    JobCorrelatedFailure, UnitFailure, UnitHandle, UnitOutcome, WorkerPool, WorkerPoolConfig,
};
pub use lifecycle::{JobError, JobLifecycleManager};
pub use store::{FileJobStore, InMemoryJobStore, JobStore, JobStoreError};
