//! The tabular intermediate form: rows of optional cells.
//!
//! A cell is either absent (`None`) or present. A present cell holds text,
//! possibly empty, or is [`Cell::Unreadable`]: it exists in the sheet but its
//! value is not a string. Absent and empty are distinct: encode never pads
//! rows, and decode treats a half-filled class pair differently from an empty
//! one.

/// A present sheet cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// A non-text value (number, boolean, formula). Carries the kind of value
    /// for error messages.
    Unreadable(&'static str),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            Cell::Unreadable(_) => None,
        }
    }
}

/// One sheet row. Cells are addressed by 0-based column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Option<Cell>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from contiguous present cells starting at column 0.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values
                .into_iter()
                .map(|v| Some(Cell::Text(v.into())))
                .collect(),
        }
    }

    /// Set a text cell, growing the row with absent cells as needed.
    pub fn set(&mut self, col: usize, value: impl Into<String>) {
        self.set_cell(col, Cell::Text(value.into()));
    }

    pub fn set_cell(&mut self, col: usize, cell: Cell) {
        if self.cells.len() <= col {
            self.cells.resize(col + 1, None);
        }
        self.cells[col] = Some(cell);
    }

    /// Text of a cell. `None` when the cell is absent or not text.
    pub fn get(&self, col: usize) -> Option<&str> {
        self.cell(col).and_then(Cell::as_text)
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col).and_then(Option::as_ref)
    }

    /// Number of addressable columns (last populated column + 1).
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Number of cells actually present.
    pub fn physical_len(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// A row with no present cells does not physically exist in a sheet.
    pub fn is_empty(&self) -> bool {
        self.physical_len() == 0
    }

    pub fn cells(&self) -> &[Option<Cell>] {
        &self.cells
    }
}

/// Ordered sheet rows. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Set a text cell, growing the grid with empty rows as needed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.set_cell(row, col, Cell::Text(value.into()));
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Row::new);
        }
        self.rows[row].set_cell(col, cell);
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of row slots, including empty ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows that hold at least one cell.
    pub fn physical_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_empty()).count()
    }

    /// Populated cell count of the header row (0 without a header).
    pub fn header_width(&self) -> usize {
        self.rows.first().map(Row::physical_len).unwrap_or(0)
    }

    /// Widest row, used for sheet dimensions.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Row::width).max().unwrap_or(0)
    }
}
