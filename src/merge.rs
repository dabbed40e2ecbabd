use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::decode::{self, Encoding};
use crate::error::{KakeiError, Result};
use crate::models::{CanonicalTransaction, MergedTransaction};

/// One merge input given as `name:type:path`, e.g.
/// `rakutenCard:credit_card:data/rakutenCard/normalized.csv`.
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub name: String,
    pub source_type: String,
    pub path: PathBuf,
}

impl FromStr for MergeInput {
    type Err = KakeiError;

    fn from_str(value: &str) -> Result<Self> {
        let mut parts = value.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(source_type), Some(path))
                if !name.is_empty() && !path.is_empty() =>
            {
                if source_type != "credit_card" && source_type != "bank" {
                    return Err(KakeiError::Other(format!(
                        "source type must be credit_card or bank, got: {source_type}"
                    )));
                }
                Ok(MergeInput {
                    name: name.to_string(),
                    source_type: source_type.to_string(),
                    path: PathBuf::from(path),
                })
            }
            _ => Err(KakeiError::Other(format!(
                "expected name:type:path, got: {value}"
            ))),
        }
    }
}

/// Read a CSV we wrote earlier. Our own output is BOM-prefixed UTF-8, but
/// hand-edited copies saved back through Excel come in as CP932, so the
/// import fallback chain applies here too.
fn load_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = std::fs::read(path)?;
    let (text, _) = decode::decode(&bytes, &[Encoding::Utf8Sig, Encoding::Cp932, Encoding::Utf8])?;
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

pub fn load_source(path: &Path) -> Result<Vec<CanonicalTransaction>> {
    load_csv(path)
}

pub fn load_source_merged(path: &Path) -> Result<Vec<MergedTransaction>> {
    load_csv(path)
}

/// Analysis order: by date with undated rows first, then source name, file
/// and row so reruns are byte-stable.
pub fn sort_transactions(records: &mut [MergedTransaction]) {
    records.sort_by(|a, b| {
        let date_a = if a.date.is_empty() { "0000-00-00" } else { &a.date };
        let date_b = if b.date.is_empty() { "0000-00-00" } else { &b.date };
        (date_a, &a.source_name, &a.source_file, a.source_row).cmp(&(
            date_b,
            &b.source_name,
            &b.source_file,
            b.source_row,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blank_canonical;
    use crate::output::write_csv;
    use tempfile::TempDir;

    #[test]
    fn test_parse_merge_input() {
        let input: MergeInput = "rakutenCard:credit_card:data/normalized.csv".parse().unwrap();
        assert_eq!(input.name, "rakutenCard");
        assert_eq!(input.source_type, "credit_card");
        assert_eq!(input.path, PathBuf::from("data/normalized.csv"));
    }

    #[test]
    fn test_parse_merge_input_rejects_bad_shapes() {
        assert!("just-a-path".parse::<MergeInput>().is_err());
        assert!("name:stocks:path.csv".parse::<MergeInput>().is_err());
        assert!(":bank:path.csv".parse::<MergeInput>().is_err());
    }

    #[test]
    fn test_load_source_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("normalized.csv");

        let mut tx = blank_canonical();
        tx.transaction_id = "abc123".to_string();
        tx.date = "2025-04-01".to_string();
        tx.merchant = "コンビニ".to_string();
        tx.amount_jpy = 500;
        tx.balance_jpy = Some(9500);
        tx.source_row = 2;
        write_csv(&path, &[tx]).unwrap();

        let loaded = load_source(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].merchant, "コンビニ");
        assert_eq!(loaded[0].amount_jpy, 500);
        assert_eq!(loaded[0].balance_jpy, Some(9500));
        assert_eq!(loaded[0].debit_jpy, None);
        assert_eq!(loaded[0].source_row, 2);
    }

    #[test]
    fn test_sort_undated_first_then_date_and_origin() {
        fn merged(date: &str, name: &str, row: usize) -> MergedTransaction {
            let mut tx = blank_canonical();
            tx.date = date.to_string();
            tx.source_row = row;
            MergedTransaction::from_canonical(tx, name, "bank", "t")
        }

        let mut records = vec![
            merged("2025-04-02", "aBank", 2),
            merged("", "zBank", 9),
            merged("2025-04-01", "bBank", 5),
            merged("2025-04-01", "aBank", 3),
        ];
        sort_transactions(&mut records);
        let order: Vec<_> = records
            .iter()
            .map(|r| (r.date.as_str(), r.source_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("", "zBank"),
                ("2025-04-01", "aBank"),
                ("2025-04-01", "bBank"),
                ("2025-04-02", "aBank"),
            ]
        );
    }
}
