//! Error types for the ledger

use crate::index::EntryIndex;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Arithmetic or comparison between amounts of different assets
    #[error("Asset mismatch: {left} vs {right}")]
    AssetMismatch {
        /// Asset of the left operand
        left: String,
        /// Asset of the right operand
        right: String,
    },

    /// Decimal overflow
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Invalid amount (negative where a magnitude is required, etc.)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Entry not found
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryIndex),

    /// Entry already exists
    #[error("Entry already exists: {0}")]
    EntryExists(EntryIndex),

    /// Entry at index has a different kind than requested
    #[error("Wrong entry kind at {index}: expected {expected}")]
    WrongEntryKind {
        /// Index looked up
        index: EntryIndex,
        /// Kind the caller asked for
        expected: &'static str,
    },

    /// Invariant violation (negative native balance, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
