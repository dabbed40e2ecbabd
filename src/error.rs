use thiserror::Error;

#[derive(Error, Debug)]
pub enum KakeiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not determine character encoding")]
    Decode,

    #[error("no header row detected (best score {best}, need at least {min})")]
    StructureDetection { best: i32, min: i32 },

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unknown source: {0} (see `kakei sources`)")]
    UnknownSource(String),

    #[error("no input files found")]
    NoInputFiles,

    #[error("no file could be processed")]
    NoUsableFiles,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KakeiError>;
