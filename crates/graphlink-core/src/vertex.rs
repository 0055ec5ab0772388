use crate::graph::overlay::EdgeOverlay;
use graphlink_common::{Edge, ElementId, GraphError, Properties, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexState {
    /// Created in this unit of work, no remote node yet.
    Transient,
    /// Backed by a remote node.
    Persisted,
}

/// A graph vertex together with the edges added to it in the current unit
/// of work.
///
/// The identifier is allocated externally and only used in queries once the
/// vertex is persisted.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: ElementId,
    labels: BTreeSet<String>,
    properties: Properties,
    state: VertexState,
    overlay: EdgeOverlay,
}

impl Vertex {
    pub fn transient<I, S>(id: impl Into<ElementId>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_state(id.into(), labels, VertexState::Transient)
    }

    pub fn persisted<I, S>(id: impl Into<ElementId>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_state(id.into(), labels, VertexState::Persisted)
    }

    fn with_state<I, S>(id: ElementId, labels: I, state: VertexState) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            labels: labels.into_iter().map(Into::into).collect(),
            properties: HashMap::new(),
            state,
            overlay: EdgeOverlay::new(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn state(&self) -> VertexState {
        self.state
    }

    pub fn is_transient(&self) -> bool {
        self.state == VertexState::Transient
    }

    /// Called once the vertex has been flushed to the store.
    pub fn mark_persisted(&mut self) {
        self.state = VertexState::Persisted;
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.properties.insert(key.into(), value);
    }

    /// Registers a locally created edge leaving this vertex.
    pub fn add_out_edge(&mut self, edge: Edge) -> Result<bool> {
        if edge.source_id != self.id {
            return Err(GraphError::InvalidArgument(format!(
                "edge {} starts at {}, not at vertex {}",
                edge.id, edge.source_id, self.id
            )));
        }
        self.overlay.add_outgoing(edge)
    }

    /// Registers a locally created edge arriving at this vertex.
    pub fn add_in_edge(&mut self, edge: Edge) -> Result<bool> {
        if edge.target_id != self.id {
            return Err(GraphError::InvalidArgument(format!(
                "edge {} ends at {}, not at vertex {}",
                edge.id, edge.target_id, self.id
            )));
        }
        self.overlay.add_incoming(edge)
    }

    pub fn remove_edge(&mut self, id: &ElementId) -> Option<Edge> {
        self.overlay.remove(id)
    }

    pub fn overlay(&self) -> &EdgeOverlay {
        &self.overlay
    }
}
