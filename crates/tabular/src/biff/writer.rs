//! Grid → `.xls` bytes.

use std::io::{Cursor, Write};

use super::records::*;
use super::sst::SstBuilder;
use super::{MAX_COLUMNS, MAX_ROWS, MAX_STRING_UNITS, SHEET_NAME, WORKBOOK_STREAM};
use crate::error::{TabularError, TabularResult};
use crate::grid::{Cell, Grid};

/// Excel refuses workbook streams that live in the compound file's mini stream.
const MIN_STREAM_LEN: usize = 4096;

/// Index of the single cell XF (after the 15 mandatory style XFs).
const CELL_XF: u16 = 15;

const FONT_COUNT: usize = 4;

/// Serialize a grid as a single-sheet BIFF8 workbook.
pub fn write_workbook(grid: &Grid) -> TabularResult<Vec<u8>> {
    check_limits(grid)?;

    let mut sst = SstBuilder::new();
    let sheet = write_sheet(grid, &mut sst);

    let mut globals = RecordWriter::new();
    globals.record(BOF, &bof_body(BOF_WORKBOOK_GLOBALS));
    globals.record(CODEPAGE, &1200u16.to_le_bytes());
    globals.record(WINDOW1, &window1_body());
    for _ in 0..FONT_COUNT {
        globals.record(FONT, &font_body("Arial"));
    }
    for _ in 0..CELL_XF {
        globals.record(XF, &xf_body(true));
    }
    globals.record(XF, &xf_body(false));
    // Built-in "Normal" style on XF 0.
    globals.record(STYLE, &[0x00, 0x80, 0x00, 0xFF]);
    let boundsheet = globals.record(BOUNDSHEET, &boundsheet_body(SHEET_NAME));

    let mut bodies = sst.into_bodies().into_iter();
    if let Some(first) = bodies.next() {
        globals.record(SST, &first);
    }
    for body in bodies {
        globals.record(CONTINUE, &body);
    }
    globals.record(EOF, &[]);

    // BOUNDSHEET points at the sheet's BOF: record header (4) is followed by lbPlyPos.
    let sheet_offset = globals.position() as u32;
    globals.patch_u32(boundsheet + 4, sheet_offset);
    globals.extend(sheet);

    let mut stream = globals.into_bytes();
    if stream.len() < MIN_STREAM_LEN {
        stream.resize(MIN_STREAM_LEN, 0);
    }

    wrap_compound(&stream)
}

fn check_limits(grid: &Grid) -> TabularResult<()> {
    if grid.len() > MAX_ROWS {
        return Err(TabularError::Limit(format!(
            "{} rows exceed the sheet maximum of {MAX_ROWS}",
            grid.len()
        )));
    }
    if grid.max_width() > MAX_COLUMNS {
        return Err(TabularError::Limit(format!(
            "{} columns exceed the sheet maximum of {MAX_COLUMNS}",
            grid.max_width()
        )));
    }
    for (r, row) in grid.rows().iter().enumerate() {
        for (c, cell) in row.cells().iter().enumerate() {
            match cell {
                Some(Cell::Text(value)) if value.encode_utf16().count() > MAX_STRING_UNITS => {
                    return Err(TabularError::Limit(format!(
                        "cell ({r}, {c}) is longer than {MAX_STRING_UNITS} characters"
                    )));
                }
                Some(Cell::Unreadable(kind)) => {
                    return Err(TabularError::container(format!(
                        "cell ({r}, {c}) holds a {kind}; only text can be written"
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn write_sheet(grid: &Grid, sst: &mut SstBuilder) -> RecordWriter {
    let mut sheet = RecordWriter::new();
    sheet.record(BOF, &bof_body(BOF_WORKSHEET));
    sheet.record(DIMENSIONS, &dimensions_body(grid));

    for (r, row) in grid.rows().iter().enumerate() {
        for (c, cell) in row.cells().iter().enumerate() {
            let Some(Cell::Text(value)) = cell else { continue };
            let index = sst.intern(value);
            let mut body = Vec::with_capacity(10);
            body.extend_from_slice(&(r as u16).to_le_bytes());
            body.extend_from_slice(&(c as u16).to_le_bytes());
            body.extend_from_slice(&CELL_XF.to_le_bytes());
            body.extend_from_slice(&index.to_le_bytes());
            sheet.record(LABELSST, &body);
        }
    }

    sheet.record(WINDOW2, &window2_body());
    sheet.record(EOF, &[]);
    sheet
}

fn wrap_compound(stream: &[u8]) -> TabularResult<Vec<u8>> {
    let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new()))?;
    {
        let mut workbook = compound.create_stream(WORKBOOK_STREAM)?;
        workbook.write_all(stream)?;
        workbook.flush()?;
    }
    compound.flush()?;
    Ok(compound.into_inner().into_inner())
}

fn bof_body(substream: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&BIFF8_VERSION.to_le_bytes());
    body.extend_from_slice(&substream.to_le_bytes());
    body.extend_from_slice(&0x0DBBu16.to_le_bytes()); // build
    body.extend_from_slice(&0x07CCu16.to_le_bytes()); // year
    body.extend_from_slice(&0u32.to_le_bytes()); // file history
    body.extend_from_slice(&6u32.to_le_bytes()); // lowest BIFF version
    body
}

fn window1_body() -> Vec<u8> {
    let mut body = Vec::with_capacity(18);
    for v in [0u16, 0, 0x4000, 0x2000, 0x0038, 0, 0, 1, 0x0258] {
        body.extend_from_slice(&v.to_le_bytes());
    }
    body
}

fn font_body(name: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(16 + name.len());
    body.extend_from_slice(&200u16.to_le_bytes()); // 10pt in twips
    body.extend_from_slice(&0u16.to_le_bytes()); // attributes
    body.extend_from_slice(&0x7FFFu16.to_le_bytes()); // automatic colour
    body.extend_from_slice(&400u16.to_le_bytes()); // normal weight
    body.extend_from_slice(&0u16.to_le_bytes()); // no super/subscript
    body.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    body.push(name.len() as u8);
    body.push(0x00); // compressed (ASCII) name
    body.extend_from_slice(name.as_bytes());
    body
}

fn xf_body(style: bool) -> Vec<u8> {
    let mut body = Vec::with_capacity(20);
    body.extend_from_slice(&0u16.to_le_bytes()); // font
    body.extend_from_slice(&0u16.to_le_bytes()); // number format "General"
    let protection: u16 = if style { 0xFFF5 } else { 0x0001 };
    body.extend_from_slice(&protection.to_le_bytes());
    body.push(0x20); // bottom aligned
    body.push(0x00); // rotation
    body.push(0x00); // indent
    body.push(if style { 0xF4 } else { 0x00 });
    body.extend_from_slice(&0u32.to_le_bytes()); // borders
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&0x20C0u16.to_le_bytes()); // default pattern colours
    body
}

fn boundsheet_body(name: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(8 + name.len());
    body.extend_from_slice(&0u32.to_le_bytes()); // patched later
    body.extend_from_slice(&0u16.to_le_bytes()); // visible worksheet
    body.push(name.len() as u8);
    body.push(0x00);
    body.extend_from_slice(name.as_bytes());
    body
}

fn dimensions_body(grid: &Grid) -> Vec<u8> {
    let last_row = grid
        .rows()
        .iter()
        .rposition(|r| !r.is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut body = Vec::with_capacity(14);
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&(last_row as u32).to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&(grid.max_width() as u16).to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body
}

fn window2_body() -> Vec<u8> {
    let mut body = Vec::with_capacity(18);
    body.extend_from_slice(&0x06B6u16.to_le_bytes()); // gridlines, headers, selected
    body.extend_from_slice(&0u16.to_le_bytes()); // top row
    body.extend_from_slice(&0u16.to_le_bytes()); // left column
    body.extend_from_slice(&64u32.to_le_bytes()); // gridline colour index
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Row;

    fn workbook_stream(bytes: &[u8]) -> Vec<u8> {
        let mut compound = cfb::CompoundFile::open(Cursor::new(bytes)).unwrap();
        let mut stream = compound.open_stream(WORKBOOK_STREAM).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut stream, &mut out).unwrap();
        out
    }

    #[test]
    fn stream_starts_with_biff8_globals_bof() {
        let mut grid = Grid::new();
        grid.push_row(Row::from_values(["Section name"]));
        let stream = workbook_stream(&write_workbook(&grid).unwrap());

        assert_eq!(u16::from_le_bytes([stream[0], stream[1]]), BOF);
        assert_eq!(u16::from_le_bytes([stream[4], stream[5]]), BIFF8_VERSION);
        assert_eq!(u16::from_le_bytes([stream[6], stream[7]]), BOF_WORKBOOK_GLOBALS);
        assert!(stream.len() >= MIN_STREAM_LEN);
    }

    #[test]
    fn boundsheet_points_at_sheet_bof() {
        let mut grid = Grid::new();
        grid.push_row(Row::from_values(["Section name", "Class name", "Class code"]));
        let stream = workbook_stream(&write_workbook(&grid).unwrap());

        let boundsheet = RecordReader::at(&stream, 0)
            .map(Result::unwrap)
            .find(|r| r.kind == BOUNDSHEET)
            .unwrap();
        let offset = u32_at(boundsheet.body, 0).unwrap() as usize;

        let bof = RecordReader::at(&stream, offset).next().unwrap().unwrap();
        assert_eq!(bof.kind, BOF);
        assert_eq!(u16_at(bof.body, 2).unwrap(), BOF_WORKSHEET);
    }

    #[test]
    fn dimensions_cover_populated_area() {
        let mut grid = Grid::new();
        grid.set(0, 0, "a");
        grid.set(2, 4, "b");
        let body = dimensions_body(&grid);
        assert_eq!(u32_at(&body, 4).unwrap(), 3);
        assert_eq!(u16_at(&body, 10).unwrap(), 5);
    }

    #[test]
    fn non_text_cells_cannot_be_written() {
        let mut grid = Grid::new();
        grid.set(0, 0, "Section name");
        grid.set_cell(1, 0, Cell::Unreadable("number"));

        let err = write_workbook(&grid).unwrap_err();
        assert!(matches!(err, TabularError::ContainerFormat(ref msg) if msg.contains("(1, 0)")));
    }
}
