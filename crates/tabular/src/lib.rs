//! `lithos-tabular`: flattening sections into a spreadsheet grid and back.
//!
//! Two layers:
//! - [`codec`]: records ⇄ [`Grid`] using the paired-column layout
//!   (`Section name | Class name | Class code | Class name | Class code ...`)
//! - [`biff`]: [`Grid`] ⇄ legacy `.xls` bytes (BIFF8 inside an OLE2 compound file)

pub mod biff;
pub mod codec;
pub mod error;
pub mod grid;

pub use biff::{read_workbook, write_workbook};
pub use codec::{decode, decode_all, encode, DecodedRecords};
pub use error::{TabularError, TabularResult};
pub use grid::{Cell, Grid, Row};
