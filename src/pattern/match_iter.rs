//! The match iterator: an odometer-style cartesian product over vertex/edge
//! slots, advancing the rightmost slot first and carrying left, skipping any
//! combination that doesn't satisfy the pattern's intrinsic constraints
//! (labels, attributes, edge endpoints/labels). Ported from
//! `match_iterator.c`.

use crate::storage::{EdgeHandle, Storage, StorageResult, VertexHandle};

use super::Pattern;

/// One full combination of bound vertices/edges, in the same order as the
/// pattern's slots.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub vertices: Vec<VertexHandle>,
    pub edges: Vec<EdgeHandle>,
}

enum Advance {
    /// The slot's underlying list is empty; there is nothing to iterate.
    EmptyList,
    /// The slot moved to its next element.
    Stepped,
    /// The slot wrapped back to the first element; the next slot to the
    /// left must also advance.
    Carried,
}

/// Walks every combination of stored vertices/edges satisfying a pattern's
/// structure. Call `next` until it returns `Ok(None)`.
pub struct MatchIterator<'p> {
    storage: Storage,
    pattern: &'p Pattern,
    started: bool,
    vertices: Vec<VertexHandle>,
    edges: Vec<EdgeHandle>,
}

impl<'p> MatchIterator<'p> {
    pub fn new(storage: &Storage, pattern: &'p Pattern) -> StorageResult<Self> {
        let mut vertices = Vec::with_capacity(pattern.vertices.len());
        for _ in 0..pattern.vertices.len() {
            vertices.push(storage.first_vertex()?);
        }

        let mut edges = Vec::with_capacity(pattern.edges.len());
        for _ in 0..pattern.edges.len() {
            edges.push(storage.first_edge()?);
        }

        Ok(Self {
            storage: storage.clone(),
            pattern,
            started: false,
            vertices,
            edges,
        })
    }

    pub fn vertices(&self) -> &[VertexHandle] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeHandle] {
        &self.edges
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn assignment(&self) -> Assignment {
        Assignment {
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Advances to the next combination satisfying the pattern's
    /// constraints. Returns `Ok(Some(()))` when positioned on a valid
    /// combination, `Ok(None)` once every combination has been exhausted.
    pub fn next(&mut self) -> StorageResult<Option<()>> {
        if self.started {
            if !self.advance_all()? {
                return Ok(None);
            }
        } else {
            self.started = true;
            if self.vertices.iter().any(|v| v.offset() == 0)
                || self.edges.iter().any(|e| e.offset() == 0)
            {
                return Ok(None);
            }
        }

        loop {
            if self.applicable()? {
                return Ok(Some(()));
            }
            if !self.advance_all()? {
                return Ok(None);
            }
        }
    }

    fn entities_amount(&self) -> usize {
        self.pattern.vertices.len() + self.pattern.edges.len()
    }

    /// Steps the rightmost slot, carrying left through as many slots as
    /// wrap. Returns `false` once the whole iteration space is exhausted
    /// (the leftmost slot carried, or some slot's list was empty).
    fn advance_all(&mut self) -> StorageResult<bool> {
        let mut carry = true;

        for index in (0..self.entities_amount()).rev() {
            if !carry {
                break;
            }

            let outcome = if index < self.pattern.vertices.len() {
                self.advance_vertex(index)?
            } else {
                self.advance_edge(index - self.pattern.vertices.len())?
            };

            match outcome {
                Advance::EmptyList => return Ok(false),
                Advance::Stepped => carry = false,
                Advance::Carried => carry = true,
            }
        }

        Ok(!carry)
    }

    fn advance_vertex(&mut self, index: usize) -> StorageResult<Advance> {
        if self.vertices[index].offset() == 0 {
            return Ok(Advance::EmptyList);
        }

        let next = self.storage.vertex_next(&self.vertices[index])?;
        if next.offset() != 0 {
            self.vertices[index] = next;
            return Ok(Advance::Stepped);
        }

        self.vertices[index] = self.storage.first_vertex()?;
        Ok(Advance::Carried)
    }

    fn advance_edge(&mut self, index: usize) -> StorageResult<Advance> {
        if self.edges[index].offset() == 0 {
            return Ok(Advance::EmptyList);
        }

        let next = self.storage.edge_next(&self.edges[index])?;
        if next.offset() != 0 {
            self.edges[index] = next;
            return Ok(Advance::Stepped);
        }

        self.edges[index] = self.storage.first_edge()?;
        Ok(Advance::Carried)
    }

    /// Whether the current combination satisfies every slot's intrinsic
    /// constraints: vertex labels/attributes, and edge endpoints/label.
    fn applicable(&self) -> StorageResult<bool> {
        for (slot, vertex) in self.pattern.vertices.iter().zip(&self.vertices) {
            for label in &slot.labels {
                if !self.storage.vertex_has_label(vertex, label)? {
                    return Ok(false);
                }
            }
            for (name, value) in &slot.attributes {
                match self.storage.vertex_get_attribute(vertex, name)? {
                    Some(actual) if &actual == value => {}
                    _ => return Ok(false),
                }
            }
        }

        for (slot, edge) in self.pattern.edges.iter().zip(&self.edges) {
            let source = self.storage.edge_get_source(edge)?;
            if source != self.vertices[slot.source] {
                return Ok(false);
            }

            let destination = self.storage.edge_get_destination(edge)?;
            if destination != self.vertices[slot.destination] {
                return Ok(false);
            }

            if let Some(label) = &slot.label {
                match self.storage.edge_get_label(edge)? {
                    Some(actual) if &actual == label => {}
                    _ => return Ok(false),
                }
            }
        }

        Ok(true)
    }
}

/// Adapts [`MatchIterator`] into a plain `Iterator` for ergonomic `for`
/// loops; each item clones the current combination's handles.
pub struct MatchIteratorAdapter<'a, 'p> {
    iter: &'a mut MatchIterator<'p>,
}

impl<'a, 'p> Iterator for MatchIteratorAdapter<'a, 'p> {
    type Item = StorageResult<Assignment>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Ok(Some(())) => Some(Ok(self.iter.assignment())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'p> MatchIterator<'p> {
    pub fn iter(&mut self) -> MatchIteratorAdapter<'_, 'p> {
        MatchIteratorAdapter { iter: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{EdgeSpec, Entity, VertexSpec};
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

    fn bare(name: &str) -> VertexSpec {
        VertexSpec {
            name: Some(name.to_string()),
            labels: vec![],
            attrs: vec![],
        }
    }

    #[test]
    fn empty_storage_yields_no_combinations() {
        let (_tmp, storage) = fresh_storage();
        let pattern = Pattern::build(&[Entity::Vertex(bare("a"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
        assert!(iter.next().unwrap().is_none());
    }

    #[test]
    fn single_vertex_slot_enumerates_every_vertex() {
        let (_tmp, storage) = fresh_storage();
        let a = storage.create_vertex().unwrap();
        let b = storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(bare("n"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();

        let mut seen = Vec::new();
        while iter.next().unwrap().is_some() {
            seen.push(iter.vertices()[0].clone());
        }
        assert_eq!(seen, vec![a, b]);
    }

    #[test]
    fn label_constraint_filters_vertices() {
        let (_tmp, storage) = fresh_storage();
        let a = storage.create_vertex().unwrap();
        storage.vertex_add_label(&a, "Person").unwrap();
        let _b = storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(VertexSpec {
            name: Some("n".into()),
            labels: vec!["Person".into()],
            attrs: vec![],
        })])
        .unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();

        let mut seen = Vec::new();
        while iter.next().unwrap().is_some() {
            seen.push(iter.vertices()[0].clone());
        }
        assert_eq!(seen, vec![a]);
    }

    #[test]
    fn two_vertex_slots_enumerate_cartesian_product_rightmost_first() {
        let (_tmp, storage) = fresh_storage();
        let a = storage.create_vertex().unwrap();
        let b = storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(bare("x")), Entity::Vertex(bare("y"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();

        let mut combos = Vec::new();
        while iter.next().unwrap().is_some() {
            combos.push((iter.vertices()[0].clone(), iter.vertices()[1].clone()));
        }
        assert_eq!(
            combos,
            vec![
                (a.clone(), a.clone()),
                (a.clone(), b.clone()),
                (b.clone(), a.clone()),
                (b.clone(), b.clone()),
            ]
        );
    }

    #[test]
    fn edge_slot_only_matches_its_endpoints() {
        let (_tmp, storage) = fresh_storage();
        let a = storage.create_vertex().unwrap();
        let b = storage.create_vertex().unwrap();
        let c = storage.create_vertex().unwrap();
        let edge = storage.create_edge().unwrap();
        storage.edge_set_source(&edge, &a).unwrap();
        storage.edge_set_destination(&edge, &b).unwrap();
        let _ = c;

        let pattern = Pattern::build(&[
            Entity::Vertex(bare("a")),
            Entity::Vertex(bare("b")),
            Entity::Edge(EdgeSpec {
                name: Some("r".into()),
                source: bare("a"),
                destination: bare("b"),
                label: None,
            }),
        ])
        .unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();

        let mut combos = Vec::new();
        while iter.next().unwrap().is_some() {
            combos.push((iter.vertices()[0].clone(), iter.vertices()[1].clone()));
        }
        assert_eq!(combos, vec![(a, b)]);
    }

    #[test]
    fn adapter_yields_owned_assignments() {
        let (_tmp, storage) = fresh_storage();
        storage.create_vertex().unwrap();
        storage.create_vertex().unwrap();

        let pattern = Pattern::build(&[Entity::Vertex(bare("n"))]).unwrap();
        let mut iter = MatchIterator::new(&storage, &pattern).unwrap();
        let count = iter.iter().filter_map(|r| r.ok()).count();
        assert_eq!(count, 2);
    }
}
