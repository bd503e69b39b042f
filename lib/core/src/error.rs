use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Dataset is empty: no complete records available")]
    EmptyDataset,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Missing column in dataset header: {0}")]
    MissingColumn(String),

    #[error("Dataset too large: more than {limit} rows")]
    DatasetTooLarge { limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
