use crate::error::Result;
use crate::sources;

pub fn run() -> Result<()> {
    println!("{:<16} {:<12} {}", "KEY", "TYPE", "DESCRIPTION");
    for spec in sources::all() {
        println!(
            "{:<16} {:<12} {}",
            spec.key,
            spec.source_type.as_str(),
            spec.label
        );
    }
    Ok(())
}
