use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Data source '{name}' failed: {details}")]
    SourceError { name: String, details: String },

    #[error("Commentary generation failed: {0}")]
    CommentaryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
