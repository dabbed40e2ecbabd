use std::path::{Path, PathBuf};

use csv::StringRecord;
use sha2::{Digest, Sha256};

use crate::columns::{check_required, map_columns, RowView};
use crate::decode;
use crate::detect::{detect_structure, parse_rows};
use crate::error::Result;
use crate::fields::{parse_amount, parse_date};
use crate::models::CanonicalTransaction;
use crate::sources::{AmountPolicy, PaymentMethodRule, SourceSpec};

/// One timestamp per run so every record written together carries the same
/// `imported_at` / `merged_at` value.
pub fn run_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

/// What one file produced. `skipped` counts data rows dropped for a parse
/// reason (bad amount, missing required date), not blank or summary rows.
pub struct FileOutcome {
    pub records: Vec<CanonicalTransaction>,
    pub skipped: usize,
    pub encoding: &'static str,
    pub delimiter: u8,
}

/// Content-addressed row identity: file name, 1-based line number and every
/// raw cell, joined with an unlikely separator, hashed and truncated. Stable
/// across re-imports of the same file.
fn transaction_id(source_file: &str, source_row: usize, record: &StringRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_file.as_bytes());
    for cell in std::iter::once(source_row.to_string().as_str()).chain(record.iter()) {
        hasher.update([0x1f]);
        hasher.update(cell.as_bytes());
    }
    hex::encode(hasher.finalize())[..16].to_string()
}

fn format_installments(installments: &str) -> String {
    let value = installments.trim();
    if value.is_empty() {
        String::new()
    } else if value.chars().all(|c| c.is_ascii_digit()) {
        match value.parse::<i64>() {
            Ok(n) => format!("{n}回払い"),
            Err(_) => value.to_string(),
        }
    } else {
        value.to_string()
    }
}

fn infer_from_transaction_type(transaction_type: &str) -> String {
    match transaction_type.trim() {
        "出金" => "口座引落/出金".to_string(),
        other => other.to_string(),
    }
}

/// Normalize one source file into canonical transactions.
pub fn transform_file(
    path: &Path,
    spec: &SourceSpec,
    default_year: Option<i32>,
    imported_at: &str,
) -> Result<FileOutcome> {
    let bytes = std::fs::read(path)?;
    let (text, encoding) = decode::decode(&bytes, spec.encodings)?;
    let structure = detect_structure(&text, spec)?;
    let rows = parse_rows(&text, structure.delimiter);

    let map = map_columns(spec, &rows[structure.header_row]);
    check_required(spec, &map)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in rows.iter().enumerate().skip(structure.header_row + 1) {
        // Physical line number in the file, so blank lines the tokenizer
        // swallows still count and ids survive preamble edits elsewhere.
        let source_row = row.position().map_or(idx + 1, |p| p.line() as usize);
        let view = RowView::new(&map, row);
        if view.is_blank() {
            continue;
        }

        let date_raw = view.get("date_raw");
        let merchant = view.get("merchant");

        // Identity guard: a row with nothing in any identifying column is
        // trailing noise, not a transaction worth counting as skipped.
        let identity_empty = match spec.amount {
            AmountPolicy::Signed | AmountPolicy::NegateSigned => {
                date_raw.is_empty() && merchant.is_empty() && view.get("amount_raw").is_empty()
            }
            AmountPolicy::DebitCredit => {
                date_raw.is_empty()
                    && merchant.is_empty()
                    && view.get("debit_raw").is_empty()
                    && view.get("credit_raw").is_empty()
            }
        };
        if identity_empty {
            continue;
        }
        if spec
            .skip_merchant_prefixes
            .iter()
            .any(|prefix| merchant.starts_with(prefix))
        {
            continue;
        }

        let short_year = if spec.allow_short_dates {
            default_year
        } else {
            None
        };
        let date = parse_date(&date_raw, short_year);
        if spec.require_date && date.is_empty() {
            skipped += 1;
            continue;
        }

        let (amount_jpy, debit_jpy, credit_jpy) = match spec.amount {
            AmountPolicy::Signed => match parse_amount(&view.get("amount_raw")) {
                Some(0) if spec.skip_zero_amounts => {
                    skipped += 1;
                    continue;
                }
                Some(amount) => (amount, None, None),
                None => {
                    skipped += 1;
                    continue;
                }
            },
            AmountPolicy::NegateSigned => match parse_amount(&view.get("amount_raw")) {
                Some(0) | None => {
                    skipped += 1;
                    continue;
                }
                Some(signed) => {
                    let amount = -signed;
                    (amount, Some(amount.max(0)), Some((-amount).max(0)))
                }
            },
            AmountPolicy::DebitCredit => {
                let debit = parse_amount(&view.get("debit_raw")).unwrap_or(0);
                let credit = parse_amount(&view.get("credit_raw")).unwrap_or(0);
                if debit == 0 && credit == 0 {
                    skipped += 1;
                    continue;
                }
                (debit - credit, Some(debit), Some(credit))
            }
        };

        let transaction_type = match spec.payment_method {
            PaymentMethodRule::AccountActivity => {
                let outgoing = match debit_jpy {
                    Some(debit) => debit > 0,
                    None => amount_jpy > 0,
                };
                if outgoing { "出金" } else { "入金" }.to_string()
            }
            _ => view.get("transaction_type"),
        };

        let payment_method = match spec.payment_method {
            PaymentMethodRule::Column => view.get("payment_method"),
            PaymentMethodRule::Installments => format_installments(&view.get("installments")),
            PaymentMethodRule::TransactionType => infer_from_transaction_type(&transaction_type),
            PaymentMethodRule::AccountActivity => "口座取引".to_string(),
        };

        let cardholder = if spec.strip_cardholder_honorific {
            view.get("cardholder").replace('様', "").trim().to_string()
        } else {
            view.get("cardholder")
        };

        records.push(CanonicalTransaction {
            transaction_id: transaction_id(&file_name, source_row, row),
            date,
            date_raw,
            merchant,
            amount_jpy,
            cardholder,
            category: view.get("category"),
            memo: view.get("memo"),
            payment_method,
            transaction_type,
            debit_jpy,
            credit_jpy,
            balance_jpy: parse_amount(&view.get("balance_raw")),
            card_number: view.get("card_number"),
            sale_type: view.get("sale_type"),
            installments: view.get("installments"),
            current_installment: view.get("current_installment"),
            source_file: file_name.clone(),
            source_row,
            source_encoding: encoding.to_string(),
            imported_at: imported_at.to_string(),
        });
    }

    Ok(FileOutcome {
        records,
        skipped,
        encoding,
        delimiter: structure.delimiter,
    })
}

/// Explicit files pass through (existing regular files only); otherwise every
/// `*.csv` in the directory, sorted, with the output file excluded so a rerun
/// never re-ingests its own product.
pub fn discover_files(
    input_dir: &Path,
    input_files: &[PathBuf],
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = if !input_files.is_empty() {
        input_files
            .iter()
            .filter(|p| p.is_file())
            .cloned()
            .collect()
    } else {
        let mut found = Vec::new();
        if input_dir.is_dir() {
            for entry in std::fs::read_dir(input_dir)? {
                let path = entry?.path();
                let is_csv = path
                    .extension()
                    .map(|ext| ext.to_ascii_lowercase() == "csv")
                    .unwrap_or(false);
                if path.is_file() && is_csv {
                    found.push(path);
                }
            }
        }
        found.sort();
        found
    };

    let resolved_output = output.canonicalize().ok();
    files.retain(|path| match (&resolved_output, path.canonicalize()) {
        (Some(out), Ok(resolved)) => resolved != *out,
        _ => true,
    });
    Ok(files)
}
