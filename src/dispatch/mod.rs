//! The request dispatcher: validates a request's pattern and WHERE clause,
//! then routes to one of the five operators. Grounded in `handle_request`
//! and the `handle_*_request` functions in `server.c`.

mod create;
mod delete;
mod error;
mod remove;
mod request;
mod response;
mod return_op;
mod set;

pub use error::DispatchError;
pub use request::{
    CreateOp, DeleteOp, Operator, RemoveChange, RemoveOp, Request, ReturnOp, ReturnValue,
    SetChange, SetOp,
};
pub use response::{Cell, Response, Row, Success, Table, VertexEntity};

use crate::pattern::{MatchIterator, Pattern};
use crate::storage::{Storage, StorageError};
use crate::where_expr::WhereExpr;

/// Runs a request against `storage`. Only a fatal `StorageError::Io` is
/// surfaced as `Err`; every other failure (pattern validation, WHERE
/// validation, an operator's own semantic checks) is reported as
/// `Response::Error` on a connection that stays usable.
pub fn dispatch(storage: &Storage, request: Request) -> Result<Response, StorageError> {
    match dispatch_inner(storage, request) {
        Ok(response) => Ok(response),
        Err(DispatchError::Storage(StorageError::Io(e))) => Err(StorageError::Io(e)),
        Err(other) => {
            tracing::warn!(error = %other, "request rejected");
            Ok(Response::Error(other.to_string()))
        }
    }
}

fn dispatch_inner(storage: &Storage, request: Request) -> Result<Response, DispatchError> {
    let pattern = Pattern::build(&request.match_entities)?;
    let pattern = if pattern.is_empty() { None } else { Some(pattern) };

    if let Some(where_clause) = &request.where_clause {
        match &pattern {
            Some(p) => where_clause.validate(p)?,
            None => {
                return Err(DispatchError::semantic(
                    "you cannot specify where without match",
                ))
            }
        }
    }

    tracing::debug!(has_match = pattern.is_some(), "dispatching request");

    let response = match request.operator {
        Operator::Create(op) => create::dispatch(storage, pattern.as_ref(), request.where_clause.as_ref(), op)?,
        Operator::Set(op) => set::dispatch(storage, pattern.as_ref(), request.where_clause.as_ref(), op)?,
        Operator::Remove(op) => remove::dispatch(storage, pattern.as_ref(), request.where_clause.as_ref(), op)?,
        Operator::Delete(op) => delete::dispatch(storage, pattern.as_ref(), request.where_clause.as_ref(), op)?,
        Operator::Return(op) => {
            return_op::dispatch(storage, pattern.as_ref(), request.where_clause.as_ref(), op)?
        }
    };

    tracing::info!(?response, "request completed");
    Ok(response)
}

/// Advances `iter` to the next combination passing `where_clause`, the way
/// `match_iterator_next_where` loops until a match or exhaustion.
pub(crate) fn next_match(
    iter: &mut MatchIterator,
    pattern: &Pattern,
    where_clause: Option<&WhereExpr>,
) -> Result<bool, DispatchError> {
    loop {
        match iter.next()? {
            None => return Ok(false),
            Some(()) => {
                if let Some(expr) = where_clause {
                    if !expr.eval(iter, pattern)? {
                        continue;
                    }
                }
                return Ok(true);
            }
        }
    }
}
