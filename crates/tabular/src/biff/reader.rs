//! `.xls` bytes → grid.

use std::io::{Cursor, Read};

use super::records::*;
use super::sst::{parse_inline_string, parse_sst};
use super::{LEGACY_BOOK_STREAM, MAX_COLUMNS, WORKBOOK_STREAM};
use crate::error::{TabularError, TabularResult};
use crate::grid::{Cell, Grid};

/// Read the first worksheet of a BIFF8 workbook into a grid.
///
/// Text cells keep their value and blank (formatted but empty) cells read as
/// empty text. Numbers, booleans and formulas are kept as
/// [`Cell::Unreadable`] so that decoding fails on the row that holds them.
pub fn read_workbook(bytes: &[u8]) -> TabularResult<Grid> {
    let stream = workbook_stream(bytes)?;
    let globals = read_globals(&stream)?;

    let sheet_offset = globals
        .first_sheet
        .ok_or_else(|| TabularError::container("workbook has no worksheet"))?;
    let grid = read_sheet(&stream, sheet_offset, &globals.strings)?;

    tracing::debug!(
        rows = grid.len(),
        shared_strings = globals.strings.len(),
        "workbook read"
    );
    Ok(grid)
}

fn workbook_stream(bytes: &[u8]) -> TabularResult<Vec<u8>> {
    let mut compound = cfb::CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| TabularError::container(format!("not a compound document: {e}")))?;

    if !compound.exists(WORKBOOK_STREAM) {
        if compound.exists(LEGACY_BOOK_STREAM) {
            return Err(TabularError::container(
                "pre-BIFF8 workbooks are not supported",
            ));
        }
        return Err(TabularError::container("no Workbook stream"));
    }

    let mut stream = compound
        .open_stream(WORKBOOK_STREAM)
        .map_err(|e| TabularError::container(format!("cannot open Workbook stream: {e}")))?;
    let mut out = Vec::new();
    stream.read_to_end(&mut out)?;
    Ok(out)
}

#[derive(Debug, Default)]
struct Globals {
    strings: Vec<String>,
    first_sheet: Option<usize>,
}

fn read_globals(stream: &[u8]) -> TabularResult<Globals> {
    let mut records = RecordReader::at(stream, 0);

    let bof = records
        .next()
        .ok_or_else(|| TabularError::container("empty Workbook stream"))??;
    check_bof(&bof, BOF_WORKBOOK_GLOBALS)?;

    let mut globals = Globals::default();
    while let Some(record) = records.next() {
        let record = record?;
        match record.kind {
            EOF => return Ok(globals),
            FILEPASS => {
                return Err(TabularError::container(
                    "encrypted workbooks are not supported",
                ));
            }
            BOUNDSHEET => {
                // Byte 5 of the body is the sheet type; 0 is a worksheet.
                let offset = u32_at(record.body, 0)? as usize;
                let sheet_type = record.body.get(5).copied().unwrap_or(0);
                if sheet_type == 0 && globals.first_sheet.is_none() {
                    globals.first_sheet = Some(offset);
                }
            }
            SST => {
                let mut segments = vec![record.body];
                while records.peek_kind() == Some(CONTINUE) {
                    if let Some(next) = records.next() {
                        segments.push(next?.body);
                    }
                }
                globals.strings = parse_sst(&segments)?;
            }
            _ => {}
        }
    }

    Err(TabularError::container("workbook globals have no EOF"))
}

fn check_bof(record: &Record<'_>, substream: u16) -> TabularResult<()> {
    if record.kind != BOF {
        return Err(TabularError::container(format!(
            "expected BOF, found record 0x{:04X}",
            record.kind
        )));
    }
    let version = u16_at(record.body, 0)?;
    if version != BIFF8_VERSION {
        return Err(TabularError::container(format!(
            "unsupported BIFF version 0x{version:04X}"
        )));
    }
    let kind = u16_at(record.body, 2)?;
    if kind != substream {
        return Err(TabularError::container(format!(
            "unexpected substream type 0x{kind:04X}"
        )));
    }
    Ok(())
}

fn read_sheet(stream: &[u8], offset: usize, strings: &[String]) -> TabularResult<Grid> {
    if offset >= stream.len() {
        return Err(TabularError::container("worksheet offset is outside the stream"));
    }
    let mut records = RecordReader::at(stream, offset);
    let bof = records
        .next()
        .ok_or_else(|| TabularError::container("missing worksheet BOF"))??;
    check_bof(&bof, BOF_WORKSHEET)?;

    let mut grid = Grid::new();
    // Embedded charts and similar carry their own BOF..EOF.
    let mut depth = 0usize;

    for record in records {
        let record = record?;
        match record.kind {
            BOF => depth += 1,
            EOF if depth == 0 => return Ok(grid),
            EOF => depth -= 1,
            _ if depth > 0 => {}
            LABELSST => {
                let (row, col) = cell_address(record.body)?;
                let index = u32_at(record.body, 6)? as usize;
                let value = strings.get(index).ok_or_else(|| {
                    TabularError::container(format!(
                        "cell at row {row}, column {col} references missing string {index}"
                    ))
                })?;
                grid.set(row, col, value.as_str());
            }
            LABEL | RSTRING => {
                let (row, col) = cell_address(record.body)?;
                grid.set(row, col, parse_inline_string(record.body, 6)?);
            }
            BLANK => {
                let (row, col) = cell_address(record.body)?;
                grid.set(row, col, "");
            }
            NUMBER | RK => {
                let (row, col) = cell_address(record.body)?;
                grid.set_cell(row, col, Cell::Unreadable("number"));
            }
            BOOLERR => {
                let (row, col) = cell_address(record.body)?;
                grid.set_cell(row, col, Cell::Unreadable("boolean"));
            }
            FORMULA => {
                let (row, col) = cell_address(record.body)?;
                grid.set_cell(row, col, Cell::Unreadable("formula"));
            }
            MULBLANK => {
                for (row, col) in cell_run(record.body, 2)? {
                    grid.set(row, col, "");
                }
            }
            MULRK => {
                for (row, col) in cell_run(record.body, 6)? {
                    grid.set_cell(row, col, Cell::Unreadable("number"));
                }
            }
            _ => {}
        }
    }

    Err(TabularError::container("worksheet has no EOF"))
}

fn cell_address(body: &[u8]) -> TabularResult<(usize, usize)> {
    let row = u16_at(body, 0)? as usize;
    let col = u16_at(body, 2)? as usize;
    if col >= MAX_COLUMNS {
        return Err(TabularError::container(format!("column {col} out of range")));
    }
    Ok((row, col))
}

/// Cell addresses covered by a MULBLANK or MULRK record.
///
/// Layout: row, first column, one `entry_len` entry per column, last column.
fn cell_run(body: &[u8], entry_len: usize) -> TabularResult<Vec<(usize, usize)>> {
    let (row, first) = cell_address(body)?;
    let last_at = body
        .len()
        .checked_sub(2)
        .ok_or_else(|| TabularError::container("record body too short"))?;
    let last = u16_at(body, last_at)? as usize;
    if last < first || last >= MAX_COLUMNS {
        return Err(TabularError::container(format!(
            "bad column run {first}..={last} at row {row}"
        )));
    }
    let count = last - first + 1;
    if 4 + count * entry_len + 2 != body.len() {
        return Err(TabularError::container(format!(
            "column run at row {row} does not match its record length"
        )));
    }
    Ok((first..=last).map(|col| (row, col)).collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::biff::write_workbook;
    use crate::grid::Row;

    /// Wrap a raw BIFF stream in a compound document.
    fn compound_with(stream_name: &str, stream: &[u8]) -> Vec<u8> {
        let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut s = compound.create_stream(stream_name).unwrap();
            s.write_all(stream).unwrap();
        }
        compound.flush().unwrap();
        compound.into_inner().into_inner()
    }

    fn bof(substream: u16) -> Vec<u8> {
        let mut body = BIFF8_VERSION.to_le_bytes().to_vec();
        body.extend_from_slice(&substream.to_le_bytes());
        body.extend_from_slice(&[0; 12]);
        body
    }

    /// Globals with one BOUNDSHEET pointing right after the globals' EOF.
    fn minimal_stream(sheet_records: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut w = RecordWriter::new();
        w.record(BOF, &bof(BOF_WORKBOOK_GLOBALS));
        let mut boundsheet = vec![0u8; 6];
        boundsheet.extend_from_slice(&[1, 0, b'S']);
        let at = w.record(BOUNDSHEET, &boundsheet);
        w.record(EOF, &[]);
        let offset = w.position() as u32;
        w.patch_u32(at + 4, offset);

        w.record(BOF, &bof(BOF_WORKSHEET));
        for (kind, body) in sheet_records {
            w.record(*kind, body);
        }
        w.record(EOF, &[]);
        w.into_bytes()
    }

    fn cell_header(row: u16, col: u16) -> Vec<u8> {
        let mut body = row.to_le_bytes().to_vec();
        body.extend_from_slice(&col.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body
    }

    fn label(row: u16, col: u16, value: &str) -> (u16, Vec<u8>) {
        let mut body = cell_header(row, col);
        body.extend_from_slice(&(value.len() as u16).to_le_bytes());
        body.push(0x00);
        body.extend_from_slice(value.as_bytes());
        (LABEL, body)
    }

    fn number(row: u16, col: u16, value: f64) -> (u16, Vec<u8>) {
        let mut body = cell_header(row, col);
        body.extend_from_slice(&value.to_le_bytes());
        (NUMBER, body)
    }

    fn read(sheet_records: &[(u16, Vec<u8>)]) -> Grid {
        read_workbook(&compound_with(WORKBOOK_STREAM, &minimal_stream(sheet_records))).unwrap()
    }

    #[test]
    fn reads_inline_label_cells() {
        let grid = read(&[label(0, 1, "ok")]);
        assert_eq!(grid.rows()[0].get(0), None);
        assert_eq!(grid.rows()[0].get(1), Some("ok"));
    }

    #[test]
    fn numeric_cells_are_kept_as_unreadable() {
        let grid = read(&[label(0, 0, "Section name"), number(3, 2, 1.5)]);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.rows()[3].cell(2), Some(&Cell::Unreadable("number")));
        assert_eq!(grid.rows()[3].get(2), None);
    }

    #[test]
    fn numeric_name_fails_only_its_row() {
        let grid = read(&[
            label(0, 0, "Section name"),
            label(0, 1, "Class name"),
            label(0, 2, "Class code"),
            label(1, 0, "S1"),
            label(1, 1, "n1"),
            label(1, 2, "c1"),
            number(2, 0, 42.0),
        ]);

        let mut records = crate::codec::decode(&grid);
        let first = records.next().unwrap().unwrap();
        assert_eq!(first.name, "S1");
        assert!(matches!(
            records.next().unwrap(),
            Err(TabularError::RowParse { row: 2, .. })
        ));
    }

    #[test]
    fn mulrk_marks_every_column_unreadable() {
        let mut body = cell_header(1, 1);
        body.truncate(4);
        for _ in 0..2 {
            body.extend_from_slice(&0u16.to_le_bytes());
            body.extend_from_slice(&0u32.to_le_bytes());
        }
        body.extend_from_slice(&2u16.to_le_bytes());

        let grid = read(&[(MULRK, body)]);
        assert_eq!(grid.rows()[1].cell(1), Some(&Cell::Unreadable("number")));
        assert_eq!(grid.rows()[1].cell(2), Some(&Cell::Unreadable("number")));
        assert_eq!(grid.rows()[1].cell(3), None);
    }

    #[test]
    fn nested_substreams_are_skipped() {
        let grid = read(&[
            (BOF, bof(0x0020)),
            number(9, 9, 0.0),
            (EOF, Vec::new()),
            label(0, 0, "a"),
        ]);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.rows()[0].get(0), Some("a"));
    }

    #[test]
    fn blank_cells_read_as_empty_text() {
        let grid = read(&[(BLANK, cell_header(0, 0))]);
        assert_eq!(grid.rows()[0].get(0), Some(""));
    }

    #[test]
    fn mulblank_expands_to_one_empty_cell_per_column() {
        let mut body = cell_header(0, 2);
        body.truncate(4);
        for _ in 0..3 {
            body.extend_from_slice(&0u16.to_le_bytes());
        }
        body.extend_from_slice(&4u16.to_le_bytes());

        let grid = read(&[label(0, 0, "Section name"), (MULBLANK, body)]);
        let row = &grid.rows()[0];
        assert_eq!(row.get(1), None);
        assert_eq!(row.get(2), Some(""));
        assert_eq!(row.get(4), Some(""));
        assert_eq!(row.physical_len(), 4);
    }

    #[test]
    fn blank_code_keeps_the_class_pair() {
        let grid = read(&[
            label(0, 0, "Section name"),
            label(0, 1, "Class name"),
            label(0, 2, "Class code"),
            label(1, 0, "S1"),
            label(1, 1, "n1"),
            (BLANK, cell_header(1, 2)),
        ]);

        let records = crate::codec::decode_all(&grid).unwrap();
        assert_eq!(records[0].classes.len(), 1);
        assert_eq!(records[0].classes[0].name, "n1");
        assert_eq!(records[0].classes[0].code, "");
    }

    #[test]
    fn blank_name_is_an_empty_section_name() {
        let grid = read(&[
            label(0, 0, "Section name"),
            (BLANK, cell_header(1, 0)),
            label(1, 1, "n1"),
        ]);

        let records = crate::codec::decode_all(&grid).unwrap();
        assert_eq!(records[0].name, "");
    }

    #[test]
    fn blank_header_cells_count_toward_the_column_bound() {
        let grid = read(&[
            label(0, 0, "Section name"),
            (BLANK, cell_header(0, 1)),
            (BLANK, cell_header(0, 2)),
            label(1, 0, "S1"),
            label(1, 1, "n1"),
            label(1, 2, "c1"),
        ]);

        assert_eq!(grid.header_width(), 3);
        let records = crate::codec::decode_all(&grid).unwrap();
        assert_eq!(records[0].classes.len(), 1);
    }

    #[test]
    fn legacy_and_encrypted_workbooks_are_rejected() {
        let legacy = compound_with(LEGACY_BOOK_STREAM, &[0u8; 16]);
        assert!(matches!(
            read_workbook(&legacy),
            Err(TabularError::ContainerFormat(_))
        ));

        let mut w = RecordWriter::new();
        w.record(BOF, &bof(BOF_WORKBOOK_GLOBALS));
        w.record(FILEPASS, &[0; 6]);
        w.record(EOF, &[]);
        let encrypted = compound_with(WORKBOOK_STREAM, &w.into_bytes());
        let err = read_workbook(&encrypted).unwrap_err();
        assert!(err.to_string().contains("encrypted"));
    }

    #[test]
    fn written_workbooks_read_back() {
        let mut grid = Grid::new();
        grid.push_row(Row::from_values(["Section name", "Class name", "Class code"]));
        grid.push_row(Row::from_values(["S1", "n1", "c1"]));
        assert_eq!(read_workbook(&write_workbook(&grid).unwrap()).unwrap(), grid);
    }
}
