//! Job model: a tracked import or export with a one-shot terminal transition.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::JobId;

/// Direction of a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    Import,
    Export,
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JobKind::Import => write!(f, "IMPORT"),
            JobKind::Export => write!(f, "EXPORT"),
        }
    }
}

/// Lifecycle state of a job.
///
/// `InProgress` is the only non-terminal state. A job leaves it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    InProgress,
    Done,
    Error,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

impl core::fmt::Display for JobState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JobState::InProgress => write!(f, "IN_PROGRESS"),
            JobState::Done => write!(f, "DONE"),
            JobState::Error => write!(f, "ERROR"),
        }
    }
}

/// A transfer job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Location of the export artifact. Always `None` for imports.
    pub resource_path: Option<PathBuf>,
}

impl Job {
    /// Create a new job in `InProgress`.
    pub fn new(kind: JobKind) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            kind,
            state: JobState::InProgress,
            created_at: now,
            updated_at: now,
            resource_path: None,
        }
    }

    /// Attach the artifact location of an export job.
    pub fn with_resource_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    pub fn resource_path(&self) -> Option<&Path> {
        self.resource_path.as_deref()
    }

    /// Move the job into a terminal state.
    ///
    /// Rejects a second transition and any transition back to `InProgress`.
    pub fn transition(&mut self, next: JobState) -> DomainResult<()> {
        if self.state.is_terminal() {
            return Err(DomainError::invariant(format!(
                "job {} is already {}",
                self.id, self.state
            )));
        }
        if !next.is_terminal() {
            return Err(DomainError::invariant(format!(
                "job {} can only move to DONE or ERROR, got {next}",
                self.id
            )));
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Entity for Job {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
