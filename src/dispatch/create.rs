use crate::pattern::{Entity, MatchIterator, Pattern};
use crate::storage::Storage;
use crate::where_expr::WhereExpr;

use super::{next_match, CreateOp, DispatchError, Response, Success};

/// CREATE: without a MATCH, builds its own pattern from `op.entities` and
/// creates fresh vertices/edges from it. With a MATCH, `op.entities` may
/// only contain edges, created once per matched combination.
pub(crate) fn dispatch(
    storage: &Storage,
    pattern: Option<&Pattern>,
    where_clause: Option<&WhereExpr>,
    op: CreateOp,
) -> Result<Response, DispatchError> {
    match pattern {
        None => create_without_match(storage, op),
        Some(pattern) => create_with_match(storage, pattern, where_clause, op),
    }
}

fn create_without_match(storage: &Storage, op: CreateOp) -> Result<Response, DispatchError> {
    let local = Pattern::build(&op.entities)?;

    let mut created_vertices = Vec::with_capacity(local.vertices.len());
    for slot in &local.vertices {
        let vertex = storage.create_vertex()?;
        for label in &slot.labels {
            storage.vertex_add_label(&vertex, label)?;
        }
        for (name, value) in &slot.attributes {
            storage.vertex_set_attribute(&vertex, name, value)?;
        }
        created_vertices.push(vertex);
    }

    let mut created = created_vertices.len() as u64;
    for slot in &local.edges {
        let edge = storage.create_edge()?;
        storage.edge_set_source(&edge, &created_vertices[slot.source])?;
        storage.edge_set_destination(&edge, &created_vertices[slot.destination])?;
        if let Some(label) = &slot.label {
            storage.edge_set_label(&edge, label)?;
        }
        created += 1;
    }

    Ok(Response::Success(Success::Amount(created)))
}

fn create_with_match(
    storage: &Storage,
    pattern: &Pattern,
    where_clause: Option<&WhereExpr>,
    op: CreateOp,
) -> Result<Response, DispatchError> {
    let mut edge_specs = Vec::with_capacity(op.entities.len());
    for entity in &op.entities {
        let edge = match entity {
            Entity::Edge(edge) => edge,
            Entity::Vertex(_) => {
                return Err(DispatchError::semantic("you cannot create vertices with match"))
            }
        };

        let source_name = edge.source.name.as_deref().ok_or_else(|| {
            DispatchError::semantic("you must use as source and destination of edges only vertex names")
        })?;
        let destination_name = edge.destination.name.as_deref().ok_or_else(|| {
            DispatchError::semantic("you must use as source and destination of edges only vertex names")
        })?;

        let source = pattern.vertex_index(source_name).ok_or_else(|| {
            DispatchError::semantic("you must use as source and destination of edges only vertex names")
        })?;
        let destination = pattern.vertex_index(destination_name).ok_or_else(|| {
            DispatchError::semantic("you must use as source and destination of edges only vertex names")
        })?;

        edge_specs.push((source, destination, edge.label.clone()));
    }

    let mut iter = MatchIterator::new(storage, pattern)?;
    let mut created = 0u64;

    while next_match(&mut iter, pattern, where_clause)? {
        for (source, destination, label) in &edge_specs {
            let edge = storage.create_edge()?;
            storage.edge_set_source(&edge, &iter.vertices()[*source])?;
            storage.edge_set_destination(&edge, &iter.vertices()[*destination])?;
            if let Some(label) = label {
                storage.edge_set_label(&edge, label)?;
            }
            created += 1;
        }
    }

    Ok(Response::Success(Success::Amount(created)))
}
