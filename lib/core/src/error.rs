use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing build artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Index for field '{field}' holds {actual} vectors, expected {expected}")]
    IndexMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Checksum mismatch for artifact: {0}")]
    ChecksumMismatch(String),

    #[error("Incompatible build: {0}")]
    IncompatibleBuild(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors that mean the process must not serve queries.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingArtifact(_)
                | Error::IndexMismatch { .. }
                | Error::InvalidDimension { .. }
                | Error::ChecksumMismatch(_)
                | Error::IncompatibleBuild(_)
                | Error::InvalidConfig(_)
        )
    }
}
