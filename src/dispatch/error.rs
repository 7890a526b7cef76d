use thiserror::Error;

use crate::pattern::PatternError;
use crate::storage::StorageError;
use crate::where_expr::WhereError;

/// An error raised while dispatching a single request. `Storage(Io)` is the
/// only variant that should be treated as fatal by a caller (the backing
/// file became unusable); everything else is a semantic rejection that
/// becomes an `error` response on an otherwise-healthy connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Where(#[from] WhereError),

    #[error("{0}")]
    Semantic(String),
}

impl DispatchError {
    pub(crate) fn semantic(message: &str) -> Self {
        DispatchError::Semantic(message.to_string())
    }
}
