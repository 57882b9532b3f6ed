//! Section records: a named section owning an ordered list of geological classes.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{ClassId, JobId, SectionId};
use crate::value_object::ValueObject;

/// A geological class belonging to a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeologicalClass {
    pub name: String,
    pub code: String,
}

impl GeologicalClass {
    /// Build a class without validation (codec and import path).
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Build a class, rejecting blank name or code.
    pub fn validated(name: impl Into<String>, code: impl Into<String>) -> DomainResult<Self> {
        let class = Self::new(name, code);
        if class.name.trim().is_empty() {
            return Err(DomainError::validation("class name is mandatory"));
        }
        if class.code.trim().is_empty() {
            return Err(DomainError::validation("class code is mandatory"));
        }
        Ok(class)
    }
}

impl ValueObject for GeologicalClass {}

/// The hierarchical payload exchanged with tabular files.
///
/// Carries no identity; the record store assigns one on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub name: String,
    #[serde(rename = "geologicalClasses", default)]
    pub classes: Vec<GeologicalClass>,
}

impl SectionRecord {
    /// Build a record without validation.
    ///
    /// Imported rows go through here: a spreadsheet cell that is present but
    /// empty is still a value.
    pub fn new(name: impl Into<String>, classes: Vec<GeologicalClass>) -> Self {
        Self {
            name: name.into(),
            classes,
        }
    }

    /// Build a record from user input, rejecting blank fields.
    pub fn validated(
        name: impl Into<String>,
        classes: Vec<GeologicalClass>,
    ) -> DomainResult<Self> {
        let record = Self::new(name, classes);
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("section name is mandatory"));
        }
        for (i, class) in self.classes.iter().enumerate() {
            GeologicalClass::validated(class.name.as_str(), class.code.as_str())
                .map_err(|e| DomainError::validation(format!("geologicalClasses[{i}]: {e}")))?;
        }
        Ok(())
    }

    pub fn has_class_code(&self, code: &str) -> bool {
        self.classes.iter().any(|c| c.code == code)
    }
}

impl ValueObject for SectionRecord {}

/// A persisted section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    #[serde(flatten)]
    pub record: SectionRecord,
    /// Import job that created this section, if any.
    #[serde(rename = "jobId", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl Entity for Section {
    type Id = SectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A geological class addressed on its own, with the section that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionClass {
    pub id: ClassId,
    pub section_id: SectionId,
    #[serde(flatten)]
    pub class: GeologicalClass,
}

impl Entity for SectionClass {
    type Id = ClassId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
