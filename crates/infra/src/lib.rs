//! Infrastructure layer: job tracking, worker pool, transfer units, stores.

pub mod jobs;
pub mod sections;
pub mod staging;
pub mod transfer;

pub use staging::StagingArea;
pub use transfer::{ExportArtifact, TransferError, TransferService};
