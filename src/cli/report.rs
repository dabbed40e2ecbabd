use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::classify::RuleBook;
use crate::engine::run_timestamp;
use crate::error::{KakeiError, Result};
use crate::output::write_text;
use crate::report;

pub fn run(input: &Path, year: i32, rules: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let book = match rules {
        Some(path) => RuleBook::load(path)?,
        None => RuleBook::empty(),
    };

    let rows = report::load_year(input, year)?;
    if rows.is_empty() {
        return Err(KakeiError::Other(format!(
            "no transactions dated in {year} found in {}",
            input.display()
        )));
    }

    let content = report::render(year, &rows, &book, &run_timestamp());
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{year}_household_cashflow.md")));
    write_text(&output, &content)?;
    println!(
        "{} year={year} rows={} output={}",
        "[DONE]".green(),
        rows.len(),
        output.display(),
    );
    Ok(())
}
