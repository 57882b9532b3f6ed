use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lithos_core::{
    ClassId, Entity, GeologicalClass, JobId, Section, SectionClass, SectionId, SectionRecord,
};

use super::{SectionStore, SectionStoreError};

/// A section row: classes are held by id, in order.
#[derive(Debug)]
struct StoredSection {
    name: String,
    job_id: Option<JobId>,
    classes: Vec<ClassId>,
}

#[derive(Debug, Default)]
struct Inner {
    sections: BTreeMap<SectionId, StoredSection>,
    classes: BTreeMap<ClassId, SectionClass>,
    next_section: u64,
    next_class: u64,
}

impl Inner {
    fn allocate(&mut self, record: SectionRecord, job_id: Option<JobId>) -> Section {
        self.next_section += 1;
        let id = SectionId(self.next_section);
        let classes = self.allocate_classes(id, record.classes.iter().cloned());
        self.sections.insert(
            id,
            StoredSection {
                name: record.name.clone(),
                job_id,
                classes,
            },
        );
        Section { id, record, job_id }
    }

    fn allocate_class(&mut self, section_id: SectionId, class: GeologicalClass) -> SectionClass {
        self.next_class += 1;
        let stored = SectionClass {
            id: ClassId(self.next_class),
            section_id,
            class,
        };
        self.classes.insert(*stored.id(), stored.clone());
        stored
    }

    fn allocate_classes(
        &mut self,
        section_id: SectionId,
        classes: impl IntoIterator<Item = GeologicalClass>,
    ) -> Vec<ClassId> {
        classes
            .into_iter()
            .map(|class| *self.allocate_class(section_id, class).id())
            .collect()
    }

    /// Assemble the section with its classes in list order.
    fn section(&self, id: SectionId) -> Option<Section> {
        let stored = self.sections.get(&id)?;
        let classes = stored
            .classes
            .iter()
            .filter_map(|class_id| self.classes.get(class_id))
            .map(|c| c.class.clone())
            .collect();
        Some(Section {
            id,
            record: SectionRecord::new(stored.name.as_str(), classes),
            job_id: stored.job_id,
        })
    }

    fn all_sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections.keys().filter_map(|id| self.section(*id))
    }
}

/// In-memory section store for tests/dev.
///
/// Section ids and class ids each start at 1 and are never reused, even after
/// deletion.
#[derive(Debug, Default)]
pub struct InMemorySectionStore {
    inner: RwLock<Inner>,
}

impl InMemorySectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, SectionStoreError> {
        self.inner
            .read()
            .map_err(|_| SectionStoreError::Storage("section store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, SectionStoreError> {
        self.inner
            .write()
            .map_err(|_| SectionStoreError::Storage("section store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl SectionStore for InMemorySectionStore {
    async fn create(&self, record: SectionRecord) -> Result<Section, SectionStoreError> {
        record.validate()?;
        Ok(self.write()?.allocate(record, None))
    }

    async fn save_imported(
        &self,
        record: SectionRecord,
        job_id: JobId,
    ) -> Result<Section, SectionStoreError> {
        Ok(self.write()?.allocate(record, Some(job_id)))
    }

    async fn get(&self, id: SectionId) -> Result<Option<Section>, SectionStoreError> {
        Ok(self.read()?.section(id))
    }

    async fn update(
        &self,
        id: SectionId,
        record: SectionRecord,
    ) -> Result<Section, SectionStoreError> {
        record.validate()?;
        let mut inner = self.write()?;
        let old = match inner.sections.get_mut(&id) {
            Some(stored) => {
                stored.name = record.name.clone();
                std::mem::take(&mut stored.classes)
            }
            None => return Err(SectionStoreError::NotFound(id)),
        };
        for class_id in old {
            inner.classes.remove(&class_id);
        }

        let classes = inner.allocate_classes(id, record.classes.iter().cloned());
        let job_id = match inner.sections.get_mut(&id) {
            Some(stored) => {
                stored.classes = classes;
                stored.job_id
            }
            None => return Err(SectionStoreError::NotFound(id)),
        };
        Ok(Section { id, record, job_id })
    }

    async fn delete(&self, id: SectionId) -> Result<(), SectionStoreError> {
        let mut inner = self.write()?;
        if let Some(stored) = inner.sections.remove(&id) {
            for class_id in stored.classes {
                inner.classes.remove(&class_id);
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Section>, SectionStoreError> {
        Ok(self.read()?.all_sections().collect())
    }

    async fn find_by_class_code(&self, code: &str) -> Result<Vec<Section>, SectionStoreError> {
        Ok(self
            .read()?
            .all_sections()
            .filter(|s| s.record.has_class_code(code))
            .collect())
    }

    async fn add_class(
        &self,
        section_id: SectionId,
        class: GeologicalClass,
    ) -> Result<SectionClass, SectionStoreError> {
        let class = GeologicalClass::validated(class.name, class.code)?;
        let mut inner = self.write()?;
        if !inner.sections.contains_key(&section_id) {
            return Err(SectionStoreError::NotFound(section_id));
        }
        let stored = inner.allocate_class(section_id, class);
        if let Some(section) = inner.sections.get_mut(&section_id) {
            section.classes.push(stored.id);
        }
        Ok(stored)
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<SectionClass>, SectionStoreError> {
        Ok(self.read()?.classes.get(&id).cloned())
    }

    async fn update_class(
        &self,
        id: ClassId,
        class: GeologicalClass,
    ) -> Result<SectionClass, SectionStoreError> {
        let class = GeologicalClass::validated(class.name, class.code)?;
        let mut inner = self.write()?;
        let stored = inner
            .classes
            .get_mut(&id)
            .ok_or(SectionStoreError::ClassNotFound(id))?;
        stored.class = class;
        Ok(stored.clone())
    }

    async fn delete_class(&self, id: ClassId) -> Result<(), SectionStoreError> {
        let mut inner = self.write()?;
        if let Some(stored) = inner.classes.remove(&id)
            && let Some(section) = inner.sections.get_mut(&stored.section_id)
        {
            section.classes.retain(|class_id| *class_id != id);
        }
        Ok(())
    }

    async fn list_classes(&self) -> Result<Vec<SectionClass>, SectionStoreError> {
        Ok(self.read()?.classes.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_core::GeologicalClass;

    fn record(name: &str, classes: &[(&str, &str)]) -> SectionRecord {
        SectionRecord::new(
            name,
            classes
                .iter()
                .map(|(n, c)| GeologicalClass::new(*n, *c))
                .collect(),
        )
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = InMemorySectionStore::new();
        let a = store.create(record("A", &[])).await.unwrap();
        let b = store.create(record("B", &[("n", "c")])).await.unwrap();

        assert_eq!(a.id, SectionId(1));
        assert_eq!(b.id, SectionId(2));
        assert!(a.job_id.is_none());
        assert_eq!(store.get(b.id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let store = InMemorySectionStore::new();
        assert!(matches!(
            store.create(record("  ", &[])).await,
            Err(SectionStoreError::Validation(_))
        ));
        assert!(matches!(
            store.create(record("S", &[("name", "")])).await,
            Err(SectionStoreError::Validation(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn imported_rows_keep_job_and_skip_validation() {
        let store = InMemorySectionStore::new();
        let job = JobId::new();
        let saved = store
            .save_imported(record("S", &[("", "")]), job)
            .await
            .unwrap();
        assert_eq!(saved.job_id, Some(job));
        assert_eq!(saved.record.classes.len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_classes() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1"), ("b", "2")])).await.unwrap();

        let updated = store.update(s.id, record("S2", &[("c", "3")])).await.unwrap();
        assert_eq!(updated.record, record("S2", &[("c", "3")]));
        assert!(matches!(
            store.update(SectionId(99), record("X", &[])).await,
            Err(SectionStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_ids_are_not_reused() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[])).await.unwrap();
        store.delete(s.id).await.unwrap();
        store.delete(s.id).await.unwrap();

        assert!(store.get(s.id).await.unwrap().is_none());
        let next = store.create(record("T", &[])).await.unwrap();
        assert_eq!(next.id, SectionId(2));
    }

    #[tokio::test]
    async fn list_is_ordered_and_search_matches_codes() {
        let store = InMemorySectionStore::new();
        store.create(record("A", &[("sand", "SD")])).await.unwrap();
        store.create(record("B", &[("clay", "CL")])).await.unwrap();
        store
            .create(record("C", &[("sand", "SD"), ("sand again", "SD")]))
            .await
            .unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.record.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let found = store.find_by_class_code("SD").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find_by_class_code("XX").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classes_get_their_own_ids() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1"), ("b", "2")])).await.unwrap();

        let classes = store.list_classes().await.unwrap();
        assert_eq!(
            classes.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ClassId(1), ClassId(2)]
        );
        assert!(classes.iter().all(|c| c.section_id == s.id));
        assert_eq!(classes[1].class, GeologicalClass::new("b", "2"));
    }

    #[tokio::test]
    async fn added_class_shows_up_in_its_section() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1")])).await.unwrap();

        let added = store
            .add_class(s.id, GeologicalClass::new("b", "2"))
            .await
            .unwrap();
        assert_eq!(added.id, ClassId(2));
        assert_eq!(added.section_id, s.id);

        let section = store.get(s.id).await.unwrap().unwrap();
        assert_eq!(section.record, record("S", &[("a", "1"), ("b", "2")]));
        assert_eq!(store.find_by_class_code("2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_class_validates_and_needs_a_section() {
        let store = InMemorySectionStore::new();
        assert!(matches!(
            store.add_class(SectionId(5), GeologicalClass::new("a", "1")).await,
            Err(SectionStoreError::NotFound(SectionId(5)))
        ));

        let s = store.create(record("S", &[])).await.unwrap();
        assert!(matches!(
            store.add_class(s.id, GeologicalClass::new("a", " ")).await,
            Err(SectionStoreError::Validation(_))
        ));
        assert!(store.list_classes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_class_keeps_position() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1"), ("b", "2")])).await.unwrap();

        let updated = store
            .update_class(ClassId(1), GeologicalClass::new("z", "9"))
            .await
            .unwrap();
        assert_eq!(updated.class, GeologicalClass::new("z", "9"));
        assert_eq!(
            store.get(s.id).await.unwrap().unwrap().record,
            record("S", &[("z", "9"), ("b", "2")])
        );
        assert!(matches!(
            store.update_class(ClassId(99), GeologicalClass::new("x", "y")).await,
            Err(SectionStoreError::ClassNotFound(ClassId(99)))
        ));
    }

    #[tokio::test]
    async fn delete_class_removes_it_from_its_section() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1"), ("b", "2")])).await.unwrap();

        store.delete_class(ClassId(1)).await.unwrap();
        store.delete_class(ClassId(1)).await.unwrap();

        assert!(store.get_class(ClassId(1)).await.unwrap().is_none());
        assert_eq!(
            store.get(s.id).await.unwrap().unwrap().record,
            record("S", &[("b", "2")])
        );
    }

    #[tokio::test]
    async fn section_update_and_delete_replace_class_ids() {
        let store = InMemorySectionStore::new();
        let s = store.create(record("S", &[("a", "1")])).await.unwrap();

        store.update(s.id, record("S", &[("b", "2")])).await.unwrap();
        assert!(store.get_class(ClassId(1)).await.unwrap().is_none());
        assert_eq!(store.get_class(ClassId(2)).await.unwrap().unwrap().section_id, s.id);

        store.delete(s.id).await.unwrap();
        assert!(store.list_classes().await.unwrap().is_empty());
    }
}
