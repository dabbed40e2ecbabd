mod classify;
mod cli;
mod columns;
mod decode;
mod detect;
mod engine;
mod error;
mod fields;
mod fmt;
mod merge;
mod models;
mod output;
mod report;
mod sources;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            files,
            source,
            input_dir,
            output,
            default_year,
        } => cli::import::run(&files, &source, &input_dir, &output, default_year),
        Commands::Merge { inputs, output } => cli::merge::run(&inputs, &output),
        Commands::Report {
            input,
            year,
            rules,
            output,
        } => cli::report::run(&input, year, rules.as_deref(), output),
        Commands::Sources => cli::sources::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
