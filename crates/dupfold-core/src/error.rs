use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Soft sentinel: `DeleteEmptyFolder` on a folder that still holds
    /// visible entries. The executor absorbs it and keeps going.
    #[error("folder is not empty")]
    NotEmptyFolder,

    #[error("operation cancelled")]
    Cancelled,

    #[error("folder pair not found")]
    PairNotFound,

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// True for errors the executor treats as non-fatal.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::NotEmptyFolder)
    }
}
