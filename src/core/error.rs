//! Error types for the crossing pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxoError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: usize,
        last_error: String,
    },

    #[error("Ledger {0} is held by another process; close it and run again")]
    LedgerLocked(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type TxoResult<T> = Result<T, TxoError>;

impl TxoError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    /// Whether a caller may reasonably try the same operation again
    pub fn is_transient(&self) -> bool {
        matches!(self, TxoError::Network(_) | TxoError::Data(_))
    }
}

impl From<serde_json::Error> for TxoError {
    fn from(e: serde_json::Error) -> Self {
        TxoError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for TxoError {
    fn from(e: reqwest::Error) -> Self {
        TxoError::Network(e.to_string())
    }
}
