use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Error(String),
    Success(Success),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Success {
    Amount(u64),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    String(String),
    Vertex(VertexEntity),
}

/// A vertex projected into a response row: its bound name plus its full set
/// of labels and attributes, matching `load_vertex_entity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexEntity {
    pub name: String,
    pub labels: Vec<String>,
    pub attributes: Vec<(String, String)>,
}
