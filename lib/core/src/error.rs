use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration in {section}: {detail}")]
    Config { section: String, detail: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Embedding failed for text {index}: {reason}")]
    Embedding { index: usize, reason: String },

    #[error("Dimension mismatch at index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

impl Error {
    pub fn config(section: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Config {
            section: section.into(),
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
