//! The WHERE filter: a small recursive boolean expression evaluated against
//! a match iterator's current combination. Ported from `check_where`/
//! `check_match_iterator_where` in `server.c`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{MatchIterator, Pattern};
use crate::storage::StorageResult;

/// A WHERE validation failure; messages match the C reference server's response
/// strings.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct WhereError(pub String);

/// A boolean expression over a MATCH pattern's named vertices/edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WhereExpr {
    /// `name.attr = value`; `name` must be a vertex slot.
    Equals {
        name: String,
        attr: String,
        value: String,
    },
    /// `name:label`; `name` may be a vertex or an edge slot.
    Label { name: String, label: String },
    Not(Box<WhereExpr>),
    And(Box<WhereExpr>, Box<WhereExpr>),
    Or(Box<WhereExpr>, Box<WhereExpr>),
}

impl WhereExpr {
    /// Checks every name this expression references resolves against
    /// `pattern`, the way `check_where`/`check_where_name` does.
    pub fn validate(&self, pattern: &Pattern) -> Result<(), WhereError> {
        match self {
            WhereExpr::Equals { name, .. } => {
                if pattern.vertex_index(name).is_some() {
                    Ok(())
                } else {
                    Err(WhereError(
                        "you can check attributes only of defined vertex names".into(),
                    ))
                }
            }
            WhereExpr::Label { name, .. } => {
                if pattern.vertex_index(name).is_some() || pattern.edge_index(name).is_some() {
                    Ok(())
                } else {
                    Err(WhereError("you cannot use in where undefined names".into()))
                }
            }
            WhereExpr::Not(inner) => inner.validate(pattern),
            WhereExpr::And(left, right) | WhereExpr::Or(left, right) => {
                left.validate(pattern)?;
                right.validate(pattern)
            }
        }
    }

    /// Evaluates this expression against the iterator's current
    /// combination. A missing attribute or absent label evaluates to
    /// `false`, never an error -- only a storage I/O failure is an `Err`.
    pub fn eval(&self, iter: &MatchIterator, pattern: &Pattern) -> StorageResult<bool> {
        match self {
            WhereExpr::Equals { name, attr, value } => {
                let idx = pattern
                    .vertex_index(name)
                    .expect("validated before evaluation");
                let actual = iter.storage().vertex_get_attribute(&iter.vertices()[idx], attr)?;
                Ok(actual.as_deref() == Some(value.as_str()))
            }
            WhereExpr::Label { name, label } => {
                if let Some(idx) = pattern.vertex_index(name) {
                    iter.storage().vertex_has_label(&iter.vertices()[idx], label)
                } else {
                    let idx = pattern.edge_index(name).expect("validated before evaluation");
                    let actual = iter.storage().edge_get_label(&iter.edges()[idx])?;
                    Ok(actual.as_deref() == Some(label.as_str()))
                }
            }
            WhereExpr::Not(inner) => Ok(!inner.eval(iter, pattern)?),
            WhereExpr::And(left, right) => Ok(left.eval(iter, pattern)? && right.eval(iter, pattern)?),
            WhereExpr::Or(left, right) => Ok(left.eval(iter, pattern)? || right.eval(iter, pattern)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Entity, VertexSpec};
    use crate::storage::Storage;
    use std::fs::File;
    use tempfile::NamedTempFile;

    fn fresh_storage() -> (NamedTempFile, Storage) {
        let tmp = NamedTempFile::new().unwrap();
        let file = File::options()
            .read(true)
            .write(true)
            .open(tmp.path())
            .unwrap();
        (tmp, Storage::init(file).unwrap())
    }

    fn named(name: &str) -> VertexSpec {
        VertexSpec {
            name: Some(name.to_string()),
            labels: vec![],
            attrs: vec![],
        }
    }

    #[test]
    fn validate_rejects_undefined_names() {
        let pattern = Pattern::build(&[Entity::Vertex(named("n"))]).unwrap();
        let expr = WhereExpr::Label {
            name: "ghost".into(),
            label: "Person".into(),
        };
        let err = expr.validate(&pattern).unwrap_err();
        assert_eq!(err.0, "you cannot use in where undefined names");
    }

    #[test]
    fn equals_false_when_attribute_missing() {
        let (_tmp, storage) = fresh_storage();
        storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(named("n"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
        iter.next().unwrap();

        let expr = WhereExpr::Equals {
            name: "n".into(),
            attr: "name".into(),
            value: "Alice".into(),
        };
        assert!(!expr.eval(&iter, &pattern).unwrap());
    }

    #[test]
    fn not_of_missing_attribute_is_true() {
        let (_tmp, storage) = fresh_storage();
        storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(named("n"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
        iter.next().unwrap();

        let expr = WhereExpr::Not(Box::new(WhereExpr::Equals {
            name: "n".into(),
            attr: "name".into(),
            value: "Alice".into(),
        }));
        assert!(expr.eval(&iter, &pattern).unwrap());
    }

    #[test]
    fn and_short_circuits_like_rust_and() {
        let (_tmp, storage) = fresh_storage();
        let v = storage.create_vertex().unwrap();
        storage.vertex_set_attribute(&v, "name", "Alice").unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(named("n"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
        iter.next().unwrap();

        let expr = WhereExpr::And(
            Box::new(WhereExpr::Equals {
                name: "n".into(),
                attr: "name".into(),
                value: "Alice".into(),
            }),
            Box::new(WhereExpr::Label {
                name: "n".into(),
                label: "Person".into(),
            }),
        );
        assert!(!expr.eval(&iter, &pattern).unwrap());
    }
}
