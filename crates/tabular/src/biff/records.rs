//! BIFF8 record framing: `[type: u16][size: u16][body: size bytes]`, little-endian.

use crate::error::{TabularError, TabularResult};

pub(crate) const BOF: u16 = 0x0809;
pub(crate) const EOF: u16 = 0x000A;
pub(crate) const CODEPAGE: u16 = 0x0042;
pub(crate) const WINDOW1: u16 = 0x003D;
pub(crate) const FONT: u16 = 0x0031;
pub(crate) const XF: u16 = 0x00E0;
pub(crate) const STYLE: u16 = 0x0293;
pub(crate) const BOUNDSHEET: u16 = 0x0085;
pub(crate) const SST: u16 = 0x00FC;
pub(crate) const CONTINUE: u16 = 0x003C;
pub(crate) const FILEPASS: u16 = 0x002F;
pub(crate) const DIMENSIONS: u16 = 0x0200;
pub(crate) const WINDOW2: u16 = 0x023E;
pub(crate) const LABELSST: u16 = 0x00FD;
pub(crate) const LABEL: u16 = 0x0204;
pub(crate) const RSTRING: u16 = 0x00D6;
pub(crate) const NUMBER: u16 = 0x0203;
pub(crate) const RK: u16 = 0x027E;
pub(crate) const MULRK: u16 = 0x00BD;
pub(crate) const BOOLERR: u16 = 0x0205;
pub(crate) const FORMULA: u16 = 0x0006;
pub(crate) const BLANK: u16 = 0x0201;
pub(crate) const MULBLANK: u16 = 0x00BE;

/// BIFF8 version word in BOF.
pub(crate) const BIFF8_VERSION: u16 = 0x0600;
pub(crate) const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub(crate) const BOF_WORKSHEET: u16 = 0x0010;

/// Largest record body allowed by BIFF8.
pub(crate) const MAX_RECORD_BODY: usize = 8224;

/// Appends framed records to a byte buffer.
#[derive(Debug, Default)]
pub(crate) struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a record and return the stream offset of its header.
    pub(crate) fn record(&mut self, kind: u16, body: &[u8]) -> usize {
        debug_assert!(body.len() <= MAX_RECORD_BODY);
        let offset = self.buf.len();
        self.buf.extend_from_slice(&kind.to_le_bytes());
        self.buf.extend_from_slice(&(body.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(body);
        offset
    }

    pub(crate) fn position(&self) -> usize {
        self.buf.len()
    }

    /// Overwrite a little-endian u32 at an absolute position.
    pub(crate) fn patch_u32(&mut self, at: usize, value: u32) {
        self.buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn extend(&mut self, other: RecordWriter) {
        self.buf.extend_from_slice(&other.buf);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// One framed record borrowed from the stream.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<'a> {
    pub kind: u16,
    pub body: &'a [u8],
}

/// Iterates framed records starting at a stream offset.
#[derive(Debug)]
pub(crate) struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Look at the next record's type without consuming it.
    pub(crate) fn peek_kind(&self) -> Option<u16> {
        self.data
            .get(self.pos..self.pos + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = TabularResult<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let Some(header) = self.data.get(self.pos..self.pos + 4) else {
            self.pos = self.data.len();
            return Some(Err(TabularError::container("truncated record header")));
        };
        let kind = u16::from_le_bytes([header[0], header[1]]);
        let size = u16::from_le_bytes([header[2], header[3]]) as usize;
        let start = self.pos + 4;
        let Some(body) = self.data.get(start..start + size) else {
            self.pos = self.data.len();
            return Some(Err(TabularError::container(format!(
                "record 0x{kind:04X} overruns the stream"
            ))));
        };
        self.pos = start + size;
        Some(Ok(Record { kind, body }))
    }
}

/// Little-endian field reads over a record body, failing as a container error.
pub(crate) fn u16_at(body: &[u8], at: usize) -> TabularResult<u16> {
    body.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| TabularError::container("record body too short"))
}

pub(crate) fn u32_at(body: &[u8], at: usize) -> TabularResult<u32> {
    body.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| TabularError::container("record body too short"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_round_trip() {
        let mut w = RecordWriter::new();
        w.record(BOF, &[1, 2, 3]);
        w.record(EOF, &[]);
        let bytes = w.into_bytes();

        let records: Vec<_> = RecordReader::at(&bytes, 0)
            .collect::<TabularResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, BOF);
        assert_eq!(records[0].body, &[1, 2, 3]);
        assert_eq!(records[1].kind, EOF);
        assert!(records[1].body.is_empty());
    }

    #[test]
    fn truncated_body_is_an_error() {
        let bytes = [0x09, 0x08, 0x10, 0x00, 0x00];
        let mut reader = RecordReader::at(&bytes, 0);
        assert!(matches!(
            reader.next(),
            Some(Err(TabularError::ContainerFormat(_)))
        ));
        assert!(reader.next().is_none());
    }
}
