//! Import/export units and the service that wires them to jobs.

mod artifact;
mod export;
mod import;
mod service;

pub use artifact::{ExportArtifact, fetch_export_artifact};
pub use export::run_export;
pub use import::run_import;
pub use service::TransferService;

use std::path::{Path, PathBuf};

use lithos_tabular::TabularError;

/// Failure inside an import or export unit that is attributable to its job.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Tabular(#[from] TabularError),
}

impl TransferError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Read, Write};

    use lithos_tabular::{Grid, write_workbook};

    const LABELSST: u16 = 0x00FD;
    const RK: u16 = 0x027E;

    /// Write `grid` as a workbook whose text cell at (`row`, `col`) is turned
    /// into the number 42.
    ///
    /// LABELSST and RK bodies are both 10 bytes (row, column, format, u32), so
    /// the record is rewritten in place.
    pub(crate) fn workbook_with_number_at(grid: &Grid, row: u16, col: u16) -> Vec<u8> {
        let written = write_workbook(grid).unwrap();
        let mut compound = cfb::CompoundFile::open(Cursor::new(written)).unwrap();
        let mut stream = Vec::new();
        compound
            .open_stream("/Workbook")
            .unwrap()
            .read_to_end(&mut stream)
            .unwrap();

        let mut pos = 0;
        let mut patched = false;
        while pos + 4 <= stream.len() {
            let kind = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
            let size = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
            let body = pos + 4;
            if kind == LABELSST
                && stream[body..body + 2] == row.to_le_bytes()
                && stream[body + 2..body + 4] == col.to_le_bytes()
            {
                stream[pos..pos + 2].copy_from_slice(&RK.to_le_bytes());
                stream[body + 6..body + 10].copy_from_slice(&0x4045_0000u32.to_le_bytes());
                patched = true;
            }
            pos = body + size;
        }
        assert!(patched, "no text cell at ({row}, {col})");

        let mut out = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut workbook = out.create_stream("/Workbook").unwrap();
            workbook.write_all(&stream).unwrap();
        }
        out.flush().unwrap();
        out.into_inner().into_inner()
    }
}
