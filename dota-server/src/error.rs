use thiserror::Error;

/// Errors the connection loop can hit. Only `Storage` (a failure of the
/// backing file itself) is fatal to the whole server; every other variant
/// terminates just the one connection it occurred on.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("client I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] dota_graph::StorageError),
}
