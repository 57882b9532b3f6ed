//! Records ⇄ grid using the paired-column layout.
//!
//! ```text
//! | Section name | Class name | Class code | Class name | Class code |
//! | S1           | n1         | c1         | n2         | c2         |
//! | S2           |
//! ```
//!
//! The header is sized by the section with the most classes; data rows are not
//! padded. Decoding reads the column bound from the header only.

use lithos_core::{GeologicalClass, SectionRecord};

use crate::error::{TabularError, TabularResult};
use crate::grid::{Cell, Grid, Row};

pub const SECTION_NAME_HEADER: &str = "Section name";
pub const CLASS_NAME_HEADER: &str = "Class name";
pub const CLASS_CODE_HEADER: &str = "Class code";

/// Flatten sections into a grid (header + one row per section, in order).
pub fn encode(records: &[SectionRecord]) -> Grid {
    let max_classes = records.iter().map(|r| r.classes.len()).max().unwrap_or(0);

    let mut grid = Grid::new();
    grid.push_row(header_row(max_classes));

    for record in records {
        let mut row = Row::new();
        row.set(0, record.name.as_str());
        for (j, class) in record.classes.iter().enumerate() {
            row.set(2 * j + 1, class.name.as_str());
            row.set(2 * j + 2, class.code.as_str());
        }
        grid.push_row(row);
    }

    grid
}

fn header_row(max_classes: usize) -> Row {
    let mut header = Row::new();
    header.set(0, SECTION_NAME_HEADER);
    for i in 0..max_classes {
        header.set(2 * i + 1, CLASS_NAME_HEADER);
        header.set(2 * i + 2, CLASS_CODE_HEADER);
    }
    header
}

/// Lazily decode the data rows of a grid, in row order.
///
/// Each item is produced only when pulled, so a caller can persist a record
/// before the next row is parsed. A grid with at most one physical row yields
/// nothing.
pub fn decode(grid: &Grid) -> DecodedRecords<'_> {
    let exhausted = grid.physical_row_count() <= 1;
    DecodedRecords {
        grid,
        column_count: grid.header_width(),
        next_row: 1,
        done: exhausted,
    }
}

/// Decode every data row, stopping at the first malformed one.
pub fn decode_all(grid: &Grid) -> TabularResult<Vec<SectionRecord>> {
    decode(grid).collect()
}

/// Iterator returned by [`decode`]. Fused after the first error.
#[derive(Debug)]
pub struct DecodedRecords<'a> {
    grid: &'a Grid,
    column_count: usize,
    next_row: usize,
    done: bool,
}

impl Iterator for DecodedRecords<'_> {
    type Item = TabularResult<SectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Rows without cells are physically absent from the sheet.
        let (index, row) = loop {
            let index = self.next_row;
            let Some(row) = self.grid.row(index) else {
                self.done = true;
                return None;
            };
            self.next_row += 1;
            if !row.is_empty() {
                break (index, row);
            }
        };

        let result = parse_row(index, row, self.column_count);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

fn parse_row(index: usize, row: &Row, column_count: usize) -> TabularResult<SectionRecord> {
    let name = match row.cell(0) {
        Some(cell) => text(index, 0, cell)?,
        None => return Err(row_error(index, "missing section name".to_string())),
    };

    let mut classes = Vec::new();
    let mut i = 1;
    while i < column_count {
        // A half-filled pair is dropped, whatever the present half holds.
        if let (Some(class_name), Some(code)) = (row.cell(i), row.cell(i + 1)) {
            classes.push(GeologicalClass::new(
                text(index, i, class_name)?,
                text(index, i + 1, code)?,
            ));
        }
        i += 2;
    }

    Ok(SectionRecord::new(name, classes))
}

fn text(index: usize, col: usize, cell: &Cell) -> TabularResult<&str> {
    match cell {
        Cell::Text(value) => Ok(value.as_str()),
        Cell::Unreadable(kind) => Err(row_error(
            index,
            format!("column {col} holds a {kind}, not text"),
        )),
    }
}

fn row_error(row: usize, reason: String) -> TabularError {
    TabularError::RowParse { row, reason }
}
