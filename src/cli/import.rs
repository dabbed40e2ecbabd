use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::engine::{discover_files, run_timestamp, transform_file};
use crate::error::{KakeiError, Result};
use crate::output::write_csv;
use crate::sources;

pub fn run(
    files: &[PathBuf],
    source: &str,
    input_dir: &Path,
    output: &Path,
    default_year: Option<i32>,
) -> Result<()> {
    let spec = sources::get(source)?;
    let files = discover_files(input_dir, files, output)?;
    if files.is_empty() {
        return Err(KakeiError::NoInputFiles);
    }

    let imported_at = run_timestamp();
    let mut all_records = Vec::new();
    let mut skipped_rows = 0usize;
    let mut processed = 0usize;

    for path in &files {
        match transform_file(path, spec, default_year, &imported_at) {
            Ok(outcome) => {
                println!(
                    "{} {} rows={} skipped={} encoding={} delimiter={:?}",
                    "[OK]".green(),
                    path.display(),
                    outcome.records.len(),
                    outcome.skipped,
                    outcome.encoding,
                    char::from(outcome.delimiter),
                );
                all_records.extend(outcome.records);
                skipped_rows += outcome.skipped;
                processed += 1;
            }
            Err(err) => {
                eprintln!("{} {}: {err}", "[NG]".red(), path.display());
            }
        }
    }

    if processed == 0 {
        return Err(KakeiError::NoUsableFiles);
    }

    write_csv(output, &all_records)?;
    println!(
        "{} files={processed} rows={} skipped={skipped_rows} output={}",
        "[DONE]".green(),
        all_records.len(),
        output.display(),
    );
    Ok(())
}
