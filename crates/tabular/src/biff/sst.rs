//! Shared string table (SST) encoding and decoding.
//!
//! The SST is one logical record split across `SST` + `CONTINUE` records of at
//! most 8224 bytes each. When a string's characters cross into a `CONTINUE`,
//! that record starts with a fresh option-flags byte (the character width may
//! change there).

use std::collections::HashMap;

use super::records::MAX_RECORD_BODY;
use crate::error::{TabularError, TabularResult};

const FLAG_HIGH_BYTE: u8 = 0x01;
const FLAG_EXT: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

/// Collects unique strings and hands out their SST indexes.
#[derive(Debug, Default)]
pub(crate) struct SstBuilder {
    index: HashMap<String, u32>,
    strings: Vec<String>,
    references: u32,
}

impl SstBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its index.
    pub(crate) fn intern(&mut self, value: &str) -> u32 {
        self.references += 1;
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.strings.len() as u32;
        self.index.insert(value.to_string(), i);
        self.strings.push(value.to_string());
        i
    }

    /// Record bodies: the first is the `SST` body, the rest are `CONTINUE` bodies.
    pub(crate) fn into_bodies(self) -> Vec<Vec<u8>> {
        let mut out = ContinuedBody::new();
        out.current.extend_from_slice(&self.references.to_le_bytes());
        out.current.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());

        for s in &self.strings {
            let units: Vec<u16> = s.encode_utf16().collect();
            // Header (cch + flags) plus the first character never split.
            let first = if units.is_empty() { 3 } else { 5 };
            if out.remaining() < first {
                out.split();
            }
            out.current.extend_from_slice(&(units.len() as u16).to_le_bytes());
            out.current.push(FLAG_HIGH_BYTE);

            let mut rest = units.as_slice();
            while !rest.is_empty() {
                let fit = (out.remaining() / 2).min(rest.len());
                if fit == 0 {
                    out.split();
                    out.current.push(FLAG_HIGH_BYTE);
                    continue;
                }
                for unit in &rest[..fit] {
                    out.current.extend_from_slice(&unit.to_le_bytes());
                }
                rest = &rest[fit..];
            }
        }

        out.finish()
    }
}

#[derive(Debug)]
struct ContinuedBody {
    done: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl ContinuedBody {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::with_capacity(MAX_RECORD_BODY),
        }
    }

    fn remaining(&self) -> usize {
        MAX_RECORD_BODY - self.current.len()
    }

    fn split(&mut self) {
        let full = std::mem::replace(&mut self.current, Vec::with_capacity(MAX_RECORD_BODY));
        self.done.push(full);
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.done.push(self.current);
        self.done
    }
}

/// Reads across the segments of a continued record.
#[derive(Debug)]
struct SegmentCursor<'a> {
    segments: &'a [&'a [u8]],
    seg: usize,
    pos: usize,
}

impl<'a> SegmentCursor<'a> {
    fn new(segments: &'a [&'a [u8]]) -> Self {
        Self {
            segments,
            seg: 0,
            pos: 0,
        }
    }

    fn available(&self) -> usize {
        self.segments
            .get(self.seg)
            .map(|s| s.len() - self.pos)
            .unwrap_or(0)
    }

    fn next_segment(&mut self) -> TabularResult<()> {
        self.seg += 1;
        self.pos = 0;
        if self.seg >= self.segments.len() {
            return Err(TabularError::container("shared string table is truncated"));
        }
        Ok(())
    }

    fn u8(&mut self) -> TabularResult<u8> {
        while self.available() == 0 {
            self.next_segment()?;
        }
        let b = self.segments[self.seg][self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> TabularResult<u16> {
        Ok(u16::from_le_bytes([self.u8()?, self.u8()?]))
    }

    fn u32(&mut self) -> TabularResult<u32> {
        Ok(u32::from_le_bytes([self.u8()?, self.u8()?, self.u8()?, self.u8()?]))
    }

    fn skip(&mut self, mut n: usize) -> TabularResult<()> {
        while n > 0 {
            if self.available() == 0 {
                self.next_segment()?;
                continue;
            }
            let step = n.min(self.available());
            self.pos += step;
            n -= step;
        }
        Ok(())
    }

    /// Read an XLUnicodeRichExtendedString.
    ///
    /// `continued` controls whether a segment boundary inside the characters
    /// carries a new flags byte (true for SST, false inside a single record).
    fn unicode_string(&mut self, continued: bool) -> TabularResult<String> {
        let cch = self.u16()? as usize;
        let flags = self.u8()?;
        let runs = if flags & FLAG_RICH != 0 { self.u16()? as usize } else { 0 };
        let ext = if flags & FLAG_EXT != 0 { self.u32()? as usize } else { 0 };

        let mut high_byte = flags & FLAG_HIGH_BYTE != 0;
        let mut units: Vec<u16> = Vec::with_capacity(cch);
        while units.len() < cch {
            if self.available() == 0 {
                if !continued {
                    return Err(TabularError::container("string overruns its record"));
                }
                self.next_segment()?;
                high_byte = self.u8()? & FLAG_HIGH_BYTE != 0;
                continue;
            }
            if high_byte {
                if self.available() < 2 {
                    return Err(TabularError::container("split UTF-16 character"));
                }
                units.push(self.u16()?);
            } else {
                units.push(self.u8()? as u16);
            }
        }

        self.skip(runs * 4 + ext)?;
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Parse the SST from its `SST` body followed by any `CONTINUE` bodies.
pub(crate) fn parse_sst(segments: &[&[u8]]) -> TabularResult<Vec<String>> {
    let mut cursor = SegmentCursor::new(segments);
    let _total = cursor.u32()?;
    let unique = cursor.u32()? as usize;

    let mut strings = Vec::with_capacity(unique.min(65_536));
    for _ in 0..unique {
        strings.push(cursor.unicode_string(true)?);
    }
    Ok(strings)
}

/// Parse an inline string (LABEL/RSTRING) that starts at `at` in a record body.
pub(crate) fn parse_inline_string(body: &[u8], at: usize) -> TabularResult<String> {
    let tail = body
        .get(at..)
        .ok_or_else(|| TabularError::container("record body too short"))?;
    let segments = [tail];
    SegmentCursor::new(&segments).unicode_string(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bodies: &[Vec<u8>]) -> Vec<String> {
        let segments: Vec<&[u8]> = bodies.iter().map(Vec::as_slice).collect();
        parse_sst(&segments).unwrap()
    }

    #[test]
    fn interning_deduplicates() {
        let mut sst = SstBuilder::new();
        assert_eq!(sst.intern("a"), 0);
        assert_eq!(sst.intern("b"), 1);
        assert_eq!(sst.intern("a"), 0);

        let bodies = sst.into_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(&bodies[0][..4], &3u32.to_le_bytes());
        assert_eq!(&bodies[0][4..8], &2u32.to_le_bytes());
        assert_eq!(parse(&bodies), vec!["a", "b"]);
    }

    #[test]
    fn long_strings_split_with_flag_bytes() {
        let mut sst = SstBuilder::new();
        let long = "é".repeat(9_000);
        sst.intern("head");
        sst.intern(&long);
        sst.intern("");

        let bodies = sst.into_bodies();
        assert!(bodies.len() >= 3);
        assert!(bodies.iter().all(|b| b.len() <= MAX_RECORD_BODY));
        assert_eq!(parse(&bodies), vec!["head".to_string(), long, String::new()]);
    }

    #[test]
    fn reads_compressed_and_rich_strings() {
        // "abc" compressed, then "xy" compressed with 1 rich-text run.
        let mut body = Vec::new();
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&3u16.to_le_bytes());
        body.push(0x00);
        body.extend_from_slice(b"abc");
        body.extend_from_slice(&2u16.to_le_bytes());
        body.push(FLAG_RICH);
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(b"xy");
        body.extend_from_slice(&[0, 0, 0, 0]);

        assert_eq!(parse(&[body]), vec!["abc", "xy"]);
    }

    #[test]
    fn width_may_change_across_continue() {
        // "abcd": first two compressed in SST, last two UTF-16 in CONTINUE.
        let mut sst = Vec::new();
        sst.extend_from_slice(&1u32.to_le_bytes());
        sst.extend_from_slice(&1u32.to_le_bytes());
        sst.extend_from_slice(&4u16.to_le_bytes());
        sst.push(0x00);
        sst.extend_from_slice(b"ab");
        let cont = vec![0x01, b'c', 0x00, b'd', 0x00];

        assert_eq!(parse(&[sst, cont]), vec!["abcd"]);
    }

    #[test]
    fn truncated_table_is_a_container_error() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.push(0x00);
        body.push(b'z');

        let segments: Vec<&[u8]> = vec![body.as_slice()];
        assert!(matches!(
            parse_sst(&segments),
            Err(TabularError::ContainerFormat(_))
        ));
    }

    #[test]
    fn inline_label_string() {
        let mut body = vec![0u8; 6];
        body.extend_from_slice(&2u16.to_le_bytes());
        body.push(0x01);
        body.extend_from_slice(&[b'h', 0, b'i', 0]);
        assert_eq!(parse_inline_string(&body, 6).unwrap(), "hi");
    }
}
