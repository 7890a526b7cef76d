use crate::pattern::{MatchIterator, Pattern};
use crate::storage::Storage;
use crate::where_expr::WhereExpr;

use super::{next_match, DeleteOp, DispatchError, Response, Success};

enum Target {
    Vertex(usize),
    Edge(usize),
}

pub(crate) fn dispatch(
    storage: &Storage,
    pattern: Option<&Pattern>,
    where_clause: Option<&WhereExpr>,
    op: DeleteOp,
) -> Result<Response, DispatchError> {
    let pattern =
        pattern.ok_or_else(|| DispatchError::semantic("you cannot delete without match"))?;

    let mut targets = Vec::with_capacity(op.names.len());
    for name in &op.names {
        if let Some(idx) = pattern.vertex_index(name) {
            targets.push(Target::Vertex(idx));
            continue;
        }
        let idx = pattern
            .edge_index(name)
            .ok_or_else(|| DispatchError::semantic("you cannot delete undefined names"))?;
        targets.push(Target::Edge(idx));
    }

    let mut iter = MatchIterator::new(storage, pattern)?;
    let mut deleted = 0u64;

    while next_match(&mut iter, pattern, where_clause)? {
        for target in &targets {
            match target {
                Target::Edge(idx) => {
                    storage.edge_drop(&iter.edges()[*idx])?;
                }
                Target::Vertex(idx) => {
                    let vertex = iter.vertices()[*idx].clone();
                    if has_incident_edge(storage, &vertex)? {
                        return Err(DispatchError::semantic(
                            "you cannot delete vertices with incident edges",
                        ));
                    }
                    storage.vertex_drop(&vertex)?;
                }
            }
            deleted += 1;
        }
    }

    Ok(Response::Success(Success::Amount(deleted)))
}

/// Scans every edge in the file -- not just matched ones -- for one with
/// `vertex` as its source or destination. Safe only because storage never
/// reclaims a dropped node's bytes, so a concurrently-unlinked edge is still
/// readable mid-scan.
fn has_incident_edge(
    storage: &Storage,
    vertex: &crate::storage::VertexHandle,
) -> Result<bool, DispatchError> {
    let mut edge = storage.first_edge()?;
    while edge.offset() != 0 {
        if &storage.edge_get_source(&edge)? == vertex || &storage.edge_get_destination(&edge)? == vertex
        {
            return Ok(true);
        }
        edge = storage.edge_next(&edge)?;
    }
    Ok(false)
}
