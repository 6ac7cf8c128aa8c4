use thiserror::Error;

/// telcoask error types
#[derive(Error, Debug)]
pub enum TelcoError {
    /// Failed to parse a dataset file
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Unreadable spreadsheet workbook
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Dataset is missing a required column
    #[error("schema error: {0}")]
    Schema(String),

    /// Configuration error (dataset path resolution, unsupported file type)
    #[error("config error: {0}")]
    Config(String),

    /// Dataset could not be published
    #[error("dataset error: {0}")]
    Dataset(String),
}

/// Result type alias for telcoask
pub type Result<T> = std::result::Result<T, TelcoError>;
