//! Error types for rdf-value-store

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Storage engine error
    #[error("storage engine error: {0}")]
    Engine(#[from] redb::Error),

    /// I/O error from the filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes do not decode to a well-formed value or namespace
    #[error("corrupt value store: {0}")]
    Corrupt(String),

    /// Caller supplied an argument the store cannot represent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An ID too large for the u32 slots embedded in IRI/literal payloads
    #[error("value ID {0} exceeds the 32-bit payload limit")]
    IdOverflow(u64),

    /// The store has been closed and can no longer be used
    #[error("value store is closed")]
    Closed,
}

impl Error {
    /// Create a corruption error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(e: redb::DatabaseError) -> Self {
        Error::Engine(e.into())
    }
}

impl From<redb::TransactionError> for Error {
    fn from(e: redb::TransactionError) -> Self {
        Error::Engine(e.into())
    }
}

impl From<redb::TableError> for Error {
    fn from(e: redb::TableError) -> Self {
        Error::Engine(e.into())
    }
}

impl From<redb::StorageError> for Error {
    fn from(e: redb::StorageError) -> Self {
        Error::Engine(e.into())
    }
}

impl From<redb::CommitError> for Error {
    fn from(e: redb::CommitError) -> Self {
        Error::Engine(e.into())
    }
}
