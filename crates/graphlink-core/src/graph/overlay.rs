// Local Edge Overlay - edges added within the current unit of work that the
// remote store may not know about yet

use graphlink_common::{Direction, Edge, ElementId, GraphError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Per-vertex sets of locally added outgoing and incoming edges, keyed by
/// edge identifier. An edge's type is fixed once it is in a set.
#[derive(Debug, Clone, Default)]
pub struct EdgeOverlay {
    outgoing: HashMap<ElementId, Edge>,
    incoming: HashMap<ElementId, Edge>,
}

impl EdgeOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(false)` when the edge was already present.
    pub fn add_outgoing(&mut self, edge: Edge) -> Result<bool> {
        Self::insert(&mut self.outgoing, edge)
    }

    /// Returns `Ok(false)` when the edge was already present.
    pub fn add_incoming(&mut self, edge: Edge) -> Result<bool> {
        Self::insert(&mut self.incoming, edge)
    }

    fn insert(set: &mut HashMap<ElementId, Edge>, edge: Edge) -> Result<bool> {
        match set.get(&edge.id) {
            Some(existing) if existing.label != edge.label => Err(GraphError::EdgeTypeConflict {
                id: edge.id.clone(),
                existing: existing.label.clone(),
                requested: edge.label,
            }),
            Some(_) => Ok(false),
            None => {
                set.insert(edge.id.clone(), edge);
                Ok(true)
            }
        }
    }

    /// Removes the edge from both sets.
    pub fn remove(&mut self, id: &ElementId) -> Option<Edge> {
        let outgoing = self.outgoing.remove(id);
        let incoming = self.incoming.remove(id);
        outgoing.or(incoming)
    }

    pub fn contains(&self, direction: Direction, id: &ElementId) -> bool {
        (direction.includes_outgoing() && self.outgoing.contains_key(id))
            || (direction.includes_incoming() && self.incoming.contains_key(id))
    }

    /// Identifiers present for `direction`, regardless of type.
    pub fn ids(&self, direction: Direction) -> BTreeSet<ElementId> {
        let mut ids = BTreeSet::new();
        if direction.includes_outgoing() {
            ids.extend(self.outgoing.keys().cloned());
        }
        if direction.includes_incoming() {
            ids.extend(self.incoming.keys().cloned());
        }
        ids
    }

    /// Snapshot of the edges for `direction` whose type is in `types`
    /// (any type when `types` is empty). A loop edge held in both sets is
    /// returned once.
    pub fn matching(&self, direction: Direction, types: &[String]) -> Vec<Edge> {
        let wanted = |edge: &&Edge| types.is_empty() || types.iter().any(|t| *t == edge.label);
        let mut seen: HashSet<&ElementId> = HashSet::new();
        let mut edges = Vec::new();

        if direction.includes_outgoing() {
            for edge in self.outgoing.values().filter(wanted) {
                seen.insert(&edge.id);
                edges.push(edge.clone());
            }
        }
        if direction.includes_incoming() {
            for edge in self.incoming.values().filter(wanted) {
                if seen.insert(&edge.id) {
                    edges.push(edge.clone());
                }
            }
        }
        edges
    }

    /// Number of distinct edges across both sets.
    pub fn len(&self) -> usize {
        self.outgoing.len()
            + self
                .incoming
                .keys()
                .filter(|id| !self.outgoing.contains_key(*id))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}
