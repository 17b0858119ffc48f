//! Error types for the chipset history library

use thiserror::Error;

/// Result type for comparator and history operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No periods were supplied to the comparator
    #[error("no periods supplied: at least one dataset is required")]
    EmptyInput,

    /// Manual entry targeted a period that was never loaded
    #[error("unknown period: {0}")]
    UnknownPeriod(String),

    /// Period key could not be derived or was empty
    #[error("invalid period key: {0}")]
    InvalidPeriodKey(String),

    /// Manual entry text could not be parsed
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// Configuration value could not be interpreted
    #[error("configuration error: {0}")]
    Config(String),
}
