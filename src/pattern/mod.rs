//! MATCH pattern construction: the wire-level entity specs a request carries
//! (`Entity`), the validated, name-resolved `Pattern` built from them, and
//! the match iterator that walks every combination of stored vertices/edges
//! satisfying a pattern's intrinsic constraints.

mod match_iter;

pub use match_iter::{Assignment, MatchIterator};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A vertex or edge entity as it appears in a request's `match`/`create`
/// entity list. Grounded in the C reference server's wire schema `VertexEntity`/
/// `EdgeEntity` messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entity {
    Vertex(VertexSpec),
    Edge(EdgeSpec),
}

/// A vertex entity: an optional name to bind it under, plus the label and
/// attribute constraints it must satisfy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexSpec {
    pub name: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
}

/// An edge entity: an optional name, its endpoints (each a reference to an
/// already-defined vertex slot, by name), and an optional label constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub name: Option<String>,
    pub source: VertexSpec,
    pub destination: VertexSpec,
    pub label: Option<String>,
}

/// A resolved, validated MATCH pattern: named/anonymous vertex and edge
/// slots, with edge endpoints resolved to vertex slot indexes.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    pub vertices: Vec<VertexSlot>,
    pub edges: Vec<EdgeSlot>,
}

#[derive(Debug, Clone)]
pub struct VertexSlot {
    pub name: Option<String>,
    pub labels: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct EdgeSlot {
    pub name: Option<String>,
    pub source: usize,
    pub destination: usize,
    pub label: Option<String>,
}

/// A pattern cannot be built from the given entities, e.g. a name was
/// redefined or an edge endpoint doesn't reference a known vertex slot.
/// Messages match the C reference server's response strings verbatim.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PatternError(pub String);

impl PatternError {
    fn new(message: &str) -> Self {
        PatternError(message.to_string())
    }
}

impl Pattern {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    pub fn vertex_index(&self, name: &str) -> Option<usize> {
        self.vertices
            .iter()
            .position(|v| v.name.as_deref() == Some(name))
    }

    pub fn edge_index(&self, name: &str) -> Option<usize> {
        self.edges
            .iter()
            .position(|e| e.name.as_deref() == Some(name))
    }

    /// Builds and validates a pattern from a flat entity list, the way
    /// `create_match_definition` does: vertex entities always introduce a
    /// new slot (checked for name collisions against both namespaces); edge
    /// entities must name endpoints that either resolve to an already-defined
    /// vertex slot, or, if the endpoint carries labels/attributes of its own,
    /// introduce a new one under that name.
    pub fn build(entities: &[Entity]) -> Result<Pattern, PatternError> {
        let mut pattern = Pattern::default();

        for entity in entities {
            match entity {
                Entity::Vertex(spec) => pattern.push_vertex(spec)?,
                Entity::Edge(spec) => pattern.push_edge(spec)?,
            }
        }

        Ok(pattern)
    }

    fn push_vertex(&mut self, spec: &VertexSpec) -> Result<(), PatternError> {
        if let Some(name) = &spec.name {
            if self.vertex_index(name).is_some() {
                return Err(PatternError::new("you cannot redefine vertex names"));
            }
            if self.edge_index(name).is_some() {
                return Err(PatternError::new("vertex name overlaps edge name"));
            }
        }

        self.vertices.push(VertexSlot {
            name: spec.name.clone(),
            labels: spec.labels.clone(),
            attributes: spec.attrs.clone(),
        });
        Ok(())
    }

    fn push_edge(&mut self, spec: &EdgeSpec) -> Result<(), PatternError> {
        if let Some(name) = &spec.name {
            if self.vertex_index(name).is_some() {
                return Err(PatternError::new("edge name overlaps vertex name"));
            }
            if self.edge_index(name).is_some() {
                return Err(PatternError::new("you cannot redefine edge names"));
            }
        }

        for endpoint in [&spec.source, &spec.destination] {
            let name = endpoint
                .name
                .as_deref()
                .ok_or_else(|| PatternError::new("vertices of edges must have defined names"))?;

            if self.edge_index(name).is_some() {
                return Err(PatternError::new("vertex name overlaps edge name"));
            }

            let carries_constraints = !endpoint.labels.is_empty() || !endpoint.attrs.is_empty();
            if carries_constraints {
                if self.vertex_index(name).is_some() {
                    return Err(PatternError::new("you cannot redefine vertex names"));
                }
                self.vertices.push(VertexSlot {
                    name: Some(name.to_string()),
                    labels: endpoint.labels.clone(),
                    attributes: endpoint.attrs.clone(),
                });
            }
        }

        let source_name = spec.source.name.as_deref().unwrap();
        let destination_name = spec.destination.name.as_deref().unwrap();

        let source = self
            .vertex_index(source_name)
            .ok_or_else(|| PatternError::new("vertices of edges must have defined names"))?;
        let destination = self
            .vertex_index(destination_name)
            .ok_or_else(|| PatternError::new("vertices of edges must have defined names"))?;

        self.edges.push(EdgeSlot {
            name: spec.name.clone(),
            source,
            destination,
            label: spec.label.clone(),
        });
        Ok(())
    }
}
