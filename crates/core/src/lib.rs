//! `lithos-core`: domain foundation for section import/export.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the job model with its one-shot terminal transition, and the
//! section record exchanged with tabular files.

pub mod entity;
pub mod error;
pub mod id;
pub mod job;
pub mod section;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ClassId, JobId, SectionId};
pub use job::{Job, JobKind, JobState};
pub use section::{GeologicalClass, Section, SectionClass, SectionRecord};
pub use value_object::ValueObject;
