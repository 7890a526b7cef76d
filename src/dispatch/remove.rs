use crate::pattern::{MatchIterator, Pattern};
use crate::storage::Storage;
use crate::where_expr::WhereExpr;

use super::{next_match, DispatchError, RemoveChange, RemoveOp, Response, Success};

enum Target {
    Vertex(usize),
    Edge(usize),
}

pub(crate) fn dispatch(
    storage: &Storage,
    pattern: Option<&Pattern>,
    where_clause: Option<&WhereExpr>,
    op: RemoveOp,
) -> Result<Response, DispatchError> {
    let pattern =
        pattern.ok_or_else(|| DispatchError::semantic("you cannot remove without match"))?;

    let mut targets = Vec::with_capacity(op.changes.len());
    for change in &op.changes {
        let name = match change {
            RemoveChange::Attr { name, .. } => name,
            RemoveChange::Label { name, .. } => name,
        };

        if let Some(idx) = pattern.vertex_index(name) {
            targets.push(Target::Vertex(idx));
            continue;
        }

        if matches!(change, RemoveChange::Attr { .. }) {
            return Err(DispatchError::semantic(
                "you can remove attributes only for vertices",
            ));
        }

        let idx = pattern
            .edge_index(name)
            .ok_or_else(|| DispatchError::semantic("you cannot set anything of undefined names"))?;
        targets.push(Target::Edge(idx));
    }

    let mut iter = MatchIterator::new(storage, pattern)?;
    let mut changed = 0u64;

    while next_match(&mut iter, pattern, where_clause)? {
        for (change, target) in op.changes.iter().zip(&targets) {
            match (change, target) {
                (RemoveChange::Attr { attr, .. }, Target::Vertex(idx)) => {
                    storage.vertex_remove_attribute(&iter.vertices()[*idx], attr)?;
                }
                (RemoveChange::Label { label, .. }, Target::Vertex(idx)) => {
                    storage.vertex_remove_label(&iter.vertices()[*idx], label)?;
                }
                (RemoveChange::Label { label, .. }, Target::Edge(idx)) => {
                    storage.edge_remove_label(&iter.edges()[*idx], label)?;
                }
                (RemoveChange::Attr { .. }, Target::Edge(_)) => {
                    unreachable!("validated to be a vertex target above")
                }
            }
            changed += 1;
        }
    }

    Ok(Response::Success(Success::Amount(changed)))
}
