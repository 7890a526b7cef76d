use thiserror::Error;

/// Errors from the offset-addressed storage engine.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A read or write against the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the expected signature.
    #[error("not a valid storage file")]
    InvalidFormat,

    /// A caller passed a name or value the format cannot represent.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

/// Result type used throughout the storage engine.
pub type StorageResult<T> = Result<T, StorageError>;
