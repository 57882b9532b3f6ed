//! Section record store.
//!
//! Import writes through [`SectionStore::save_imported`] one row at a time;
//! export reads a snapshot via [`SectionStore::list`]. Geological classes
//! have their own ids and can also be addressed one at a time.

mod memory;
mod seed;

pub use memory::InMemorySectionStore;
pub use seed::{sample_sections, seed_if_empty};

use lithos_core::{
    ClassId, DomainError, GeologicalClass, JobId, Section, SectionClass, SectionId, SectionRecord,
};

/// Section store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SectionStoreError {
    #[error("section not found: {0}")]
    NotFound(SectionId),
    #[error("geological class not found: {0}")]
    ClassNotFound(ClassId),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for SectionStoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Persistence for sections and their geological classes.
#[async_trait::async_trait]
pub trait SectionStore: Send + Sync {
    /// Validate and store a new section.
    async fn create(&self, record: SectionRecord) -> Result<Section, SectionStoreError>;

    /// Store a row read from an imported file, tagged with the importing job.
    ///
    /// Imported rows are stored as read, without field validation.
    async fn save_imported(
        &self,
        record: SectionRecord,
        job_id: JobId,
    ) -> Result<Section, SectionStoreError>;

    async fn get(&self, id: SectionId) -> Result<Option<Section>, SectionStoreError>;

    /// Replace a section's name and class list.
    ///
    /// The replaced classes are removed; the new ones get fresh class ids.
    async fn update(
        &self,
        id: SectionId,
        record: SectionRecord,
    ) -> Result<Section, SectionStoreError>;

    /// Remove a section and its classes. Removing an absent section is not an
    /// error.
    async fn delete(&self, id: SectionId) -> Result<(), SectionStoreError>;

    /// All sections in ascending id order.
    async fn list(&self) -> Result<Vec<Section>, SectionStoreError>;

    /// Sections having at least one class with `code`.
    async fn find_by_class_code(&self, code: &str) -> Result<Vec<Section>, SectionStoreError>;

    /// Validate `class` and append it to the section's class list.
    async fn add_class(
        &self,
        section_id: SectionId,
        class: GeologicalClass,
    ) -> Result<SectionClass, SectionStoreError>;

    async fn get_class(&self, id: ClassId) -> Result<Option<SectionClass>, SectionStoreError>;

    /// Validate and replace a class's name and code, keeping its position.
    async fn update_class(
        &self,
        id: ClassId,
        class: GeologicalClass,
    ) -> Result<SectionClass, SectionStoreError>;

    /// Remove a class from its section. Removing an absent class is not an
    /// error.
    async fn delete_class(&self, id: ClassId) -> Result<(), SectionStoreError>;

    /// All classes of all sections in ascending id order.
    async fn list_classes(&self) -> Result<Vec<SectionClass>, SectionStoreError>;
}
