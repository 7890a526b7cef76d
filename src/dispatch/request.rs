use serde::{Deserialize, Serialize};

use crate::pattern::Entity;
use crate::where_expr::WhereExpr;

/// A fully-structured request: the MATCH entities (empty if there is no
/// MATCH clause), an optional WHERE filter, and the operator to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub match_entities: Vec<Entity>,
    pub where_clause: Option<WhereExpr>,
    pub operator: Operator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operator {
    Create(CreateOp),
    Set(SetOp),
    Remove(RemoveOp),
    Delete(DeleteOp),
    Return(ReturnOp),
}

/// CREATE: with no MATCH, `entities` are the vertices/edges to create
/// (edges referencing vertices defined earlier in the same list). With a
/// MATCH, `entities` may contain only edges, whose endpoints must name
/// slots from the outer pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOp {
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOp {
    pub changes: Vec<SetChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SetChange {
    Attr {
        name: String,
        attr: String,
        value: String,
    },
    Label {
        name: String,
        label: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveOp {
    pub changes: Vec<RemoveChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RemoveChange {
    Attr { name: String, attr: String },
    Label { name: String, label: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOp {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOp {
    pub values: Vec<ReturnValue>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnValue {
    pub name: String,
    pub attr: Option<String>,
}
