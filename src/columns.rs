use std::collections::HashMap;

use csv::StringRecord;

use crate::error::{KakeiError, Result};
use crate::fields::{normalize_cell, normalize_header};
use crate::sources::SourceSpec;

/// Resolved canonical key to column index mapping for one file.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    map: HashMap<&'static str, usize>,
}

impl ColumnMap {
    pub fn get(&self, key: &str) -> Option<usize> {
        self.map.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }
}

fn find_column(aliases: &[&'static str], headers: &[String]) -> Option<usize> {
    // Exact pass first so `利用金額` does not get claimed by a longer header
    // via containment when a verbatim column exists.
    for alias in aliases {
        let alias = normalize_header(alias);
        if let Some(idx) = headers.iter().position(|h| *h == alias) {
            return Some(idx);
        }
    }
    for alias in aliases {
        let alias = normalize_header(alias);
        if let Some(idx) = headers.iter().position(|h| h.contains(&alias)) {
            return Some(idx);
        }
    }
    None
}

/// Resolve every canonical key the source knows about against a header row.
/// Keys that match nothing are simply absent from the map.
pub fn map_columns(spec: &SourceSpec, header: &StringRecord) -> ColumnMap {
    let headers: Vec<String> = header.iter().map(normalize_header).collect();
    let mut map = HashMap::new();
    for (key, aliases) in spec.aliases {
        if let Some(idx) = find_column(aliases, &headers) {
            map.insert(*key, idx);
        }
    }
    ColumnMap { map }
}

/// How header-like a candidate row is for this source. Scoring matches
/// aliases exactly; the looser containment fallback is reserved for mapping,
/// where the header row is already known. Required keys weigh three times an
/// optional key so a lone `摘要` cell in a preamble row cannot outscore the
/// real header.
pub fn score_header(spec: &SourceSpec, header: &StringRecord) -> i32 {
    let headers: Vec<String> = header.iter().map(normalize_header).collect();
    let mut score = 0;
    for (key, aliases) in spec.aliases {
        let hit = aliases
            .iter()
            .any(|alias| headers.iter().any(|h| *h == normalize_header(alias)));
        if hit {
            score += if spec.is_required(key) { 3 } else { 1 };
        }
    }
    score
}

/// Fail the file if any required key went unresolved, naming all of them.
pub fn check_required(spec: &SourceSpec, map: &ColumnMap) -> Result<()> {
    let missing: Vec<String> = spec
        .required
        .iter()
        .filter(|key| !map.contains(key))
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(KakeiError::MissingColumns(missing))
    }
}

/// One data row seen through the column map. Lookups are bounds checked;
/// short rows read as empty cells rather than panicking.
pub struct RowView<'a> {
    map: &'a ColumnMap,
    record: &'a StringRecord,
}

impl<'a> RowView<'a> {
    pub fn new(map: &'a ColumnMap, record: &'a StringRecord) -> Self {
        RowView { map, record }
    }

    /// Normalized cell for a canonical key, or empty when the key is unmapped
    /// or the row is too short.
    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .and_then(|idx| self.record.get(idx))
            .map(normalize_cell)
            .unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.record.iter().all(|cell| normalize_cell(cell).is_empty())
    }
}
