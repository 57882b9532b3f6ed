//! Legacy `.xls` container: BIFF8 records inside an OLE2 compound document.
//!
//! Only what the section exchange needs is supported: one worksheet, text
//! cells, 0-based addressing. No styles beyond the mandatory defaults, no
//! formulas, no numbers.

mod reader;
mod records;
mod sst;
mod writer;

pub use reader::read_workbook;
pub use writer::write_workbook;

/// Name of the BIFF8 stream inside the compound document.
pub(crate) const WORKBOOK_STREAM: &str = "/Workbook";
/// BIFF5 and older name the stream `Book`.
pub(crate) const LEGACY_BOOK_STREAM: &str = "/Book";
/// Name given to the single sheet we write.
pub const SHEET_NAME: &str = "Sections";

/// BIFF8 sheet limits.
pub const MAX_ROWS: usize = 65_536;
pub const MAX_COLUMNS: usize = 256;
pub const MAX_STRING_UNITS: usize = 32_767;
