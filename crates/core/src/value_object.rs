//! Value object trait: equality by value, not identity.
//!
//! A section record read out of a spreadsheet row has no identity of its own;
//! two records with the same name and classes are the same record. Identity is
//! only assigned once a record is persisted (see [`crate::Section`]).

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
