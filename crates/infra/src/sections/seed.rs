//! Sample data stored on first start.

use lithos_core::{GeologicalClass, SectionRecord};

use super::{SectionStore, SectionStoreError};

/// The two sample sections, each with two classes.
pub fn sample_sections() -> Vec<SectionRecord> {
    (1..=2)
        .map(|s| {
            SectionRecord::new(
                format!("Init Section {s}"),
                (1..=2)
                    .map(|c| {
                        GeologicalClass::new(
                            format!("Init Geo Class {s}{c}"),
                            format!("Init GC{s}{c}"),
                        )
                    })
                    .collect(),
            )
        })
        .collect()
}

/// Store [`sample_sections`] when the store holds no section yet.
///
/// Returns how many sections were created.
pub async fn seed_if_empty<R>(store: &R) -> Result<usize, SectionStoreError>
where
    R: SectionStore + ?Sized,
{
    if !store.list().await?.is_empty() {
        tracing::info!("section store already initialized");
        return Ok(0);
    }

    let samples = sample_sections();
    let count = samples.len();
    for record in samples {
        store.create(record).await?;
    }
    tracing::info!(sections = count, "initialized section store with sample data");
    Ok(count)
}
