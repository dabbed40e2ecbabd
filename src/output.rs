use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Write records as UTF-8 CSV with a BOM so spreadsheet tools that sniff the
/// encoding (Excel in particular) open Japanese text correctly. The header
/// row comes from the record type's field names.
pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a rendered text report, creating parent directories as needed.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}
