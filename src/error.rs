use thiserror::Error;

#[derive(Error, Debug)]
pub enum CasonaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown billing unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Column mapping incomplete: missing {0}")]
    MappingIncomplete(String),

    #[error("Listing '{0}' has no assigned billing unit")]
    UnassignedListing(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CasonaError>;
