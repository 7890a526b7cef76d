use crate::pattern::{MatchIterator, Pattern};
use crate::storage::{Storage, VertexHandle};
use crate::where_expr::WhereExpr;

use super::{next_match, Cell, DispatchError, Response, ReturnOp, ReturnValue, Row, Success, Table, VertexEntity};

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 1000;

pub(crate) fn dispatch(
    storage: &Storage,
    pattern: Option<&Pattern>,
    where_clause: Option<&WhereExpr>,
    op: ReturnOp,
) -> Result<Response, DispatchError> {
    let pattern =
        pattern.ok_or_else(|| DispatchError::semantic("you cannot return without match"))?;

    let limit = op.limit.unwrap_or(DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        return Err(DispatchError::semantic(
            "limit value exceeded max value 1000",
        ));
    }
    let skip = op.skip.unwrap_or(0);

    let mut indexes = Vec::with_capacity(op.values.len());
    let mut columns = Vec::with_capacity(op.values.len());
    for value in &op.values {
        let idx = pattern.vertex_index(&value.name).ok_or_else(|| {
            DispatchError::semantic("you can return only vertices and they attributes")
        })?;
        indexes.push(idx);
        columns.push(match &value.attr {
            Some(attr) => format!("{}.{}", value.name, attr),
            None => value.name.clone(),
        });
    }

    let mut iter = MatchIterator::new(storage, pattern)?;
    let mut rows = Vec::new();
    let mut skipped = 0u64;

    while next_match(&mut iter, pattern, where_clause)? {
        if skipped < skip {
            skipped += 1;
            continue;
        }
        if rows.len() as u64 >= limit {
            break;
        }

        let mut cells = Vec::with_capacity(op.values.len());
        for (value, idx) in op.values.iter().zip(&indexes) {
            let vertex = &iter.vertices()[*idx];
            cells.push(match &value.attr {
                Some(attr) => match storage.vertex_get_attribute(vertex, attr)? {
                    Some(value) => Cell::String(value),
                    None => Cell::Null,
                },
                None => Cell::Vertex(load_vertex_entity(storage, &value.name, vertex)?),
            });
        }
        rows.push(Row { cells });
    }

    Ok(Response::Success(Success::Table(Table { columns, rows })))
}

/// Projects a vertex handle into its full wire representation: every label
/// and every attribute whose value hasn't been tombstoned.
fn load_vertex_entity(
    storage: &Storage,
    name: &str,
    vertex: &VertexHandle,
) -> Result<VertexEntity, DispatchError> {
    let mut labels = Vec::new();
    let mut label = storage.vertex_first_label(vertex)?;
    while label.offset() != 0 {
        labels.push(storage.label_get(&label)?);
        label = storage.label_next(&label)?;
    }

    let mut attributes = Vec::new();
    let mut attr = storage.vertex_first_attribute(vertex)?;
    while attr.offset() != 0 {
        let (attr_name, value) = storage.attribute_get(&attr)?;
        if let Some(value) = value {
            attributes.push((attr_name, value));
        }
        attr = storage.attribute_next(&attr)?;
    }

    Ok(VertexEntity {
        name: name.to_string(),
        labels,
        attributes,
    })
}
