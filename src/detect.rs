use csv::{ReaderBuilder, StringRecord};

use crate::columns::score_header;
use crate::error::{KakeiError, Result};
use crate::sources::SourceSpec;

/// Candidate delimiters in priority order. Comma ties beat tab ties beat
/// semicolon ties.
const DELIMITERS: &[u8] = &[b',', b'\t', b';'];

/// How far into the file the header hunt goes. Vendor exports put account
/// preambles above the header but never this deep.
const SCAN_ROWS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    pub delimiter: u8,
    /// Zero-based index of the header row within the parsed rows.
    pub header_row: usize,
    pub score: i32,
}

fn scan_rows(text: &str, delimiter: u8) -> Vec<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader
        .records()
        .take(SCAN_ROWS)
        .filter_map(|r| r.ok())
        .collect()
}

/// Find the delimiter and header row jointly. Every (delimiter, row) pair in
/// the scan window is scored against the source's alias table; the first pair
/// to reach the maximum score wins, so delimiter priority and row order break
/// ties. A best score below the source threshold fails the file.
pub fn detect_structure(text: &str, spec: &SourceSpec) -> Result<Structure> {
    let mut best: Option<Structure> = None;
    for &delimiter in DELIMITERS {
        for (row, record) in scan_rows(text, delimiter).iter().enumerate() {
            let score = score_header(spec, record);
            if best.map_or(true, |b| score > b.score) {
                best = Some(Structure {
                    delimiter,
                    header_row: row,
                    score,
                });
            }
        }
    }

    match best {
        Some(found) if found.score >= spec.min_score => Ok(found),
        other => Err(KakeiError::StructureDetection {
            best: other.map_or(0, |b| b.score),
            min: spec.min_score,
        }),
    }
}

/// Parse the whole file with the detected delimiter. Rows the tokenizer
/// rejects are dropped; downstream indexing stays aligned with the scan
/// because the scan dropped them the same way.
pub fn parse_rows(text: &str, delimiter: u8) -> Vec<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    reader.records().filter_map(|r| r.ok()).collect()
}
