use std::path::Path;

use colored::Colorize;

use crate::engine::run_timestamp;
use crate::error::{KakeiError, Result};
use crate::merge::{load_source, sort_transactions, MergeInput};
use crate::models::MergedTransaction;
use crate::output::write_csv;

pub fn run(inputs: &[MergeInput], output: &Path) -> Result<()> {
    let merged_at = run_timestamp();
    let mut all_records: Vec<MergedTransaction> = Vec::new();
    let mut used_sources = 0usize;

    for input in inputs {
        if !input.path.exists() {
            println!(
                "{} missing source: {}",
                "[WARN]".yellow(),
                input.path.display()
            );
            continue;
        }
        match load_source(&input.path) {
            Ok(records) => {
                let count = records.len();
                all_records.extend(records.into_iter().map(|tx| {
                    MergedTransaction::from_canonical(tx, &input.name, &input.source_type, &merged_at)
                }));
                used_sources += 1;
                println!(
                    "{} {} records={count} path={}",
                    "[OK]".green(),
                    input.name,
                    input.path.display()
                );
            }
            Err(err) => {
                eprintln!(
                    "{} {} path={}: {err}",
                    "[NG]".red(),
                    input.name,
                    input.path.display()
                );
            }
        }
    }

    if used_sources == 0 {
        return Err(KakeiError::NoUsableFiles);
    }

    sort_transactions(&mut all_records);
    write_csv(output, &all_records)?;
    println!(
        "{} sources={used_sources} records={} output={}",
        "[DONE]".green(),
        all_records.len(),
        output.display(),
    );
    Ok(())
}
