// Edge Resolver - answers "edges of this vertex" by merging the local overlay
// with a partition-scoped remote query

use crate::graph::query_builder::{EdgeQuery, EdgeQueryBuilder, TypeRestriction};
use crate::identifier::{id_provider_from_config, IdProvider};
use crate::partition::{partition_from_config, Partition};
use crate::session::{EdgeProjection, Session};
use crate::stream::{EdgeStream, RemoteEdges};
use crate::vertex::Vertex;
use graphlink_common::config::{AppConfig, QueryConfig};
use graphlink_common::{Direction, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves the edges of a vertex against one session.
///
/// Nothing is cached between calls: every `edges` call re-reads the overlay
/// and, for persisted vertices, re-runs the remote query.
pub struct EdgeResolver {
    session: Arc<dyn Session>,
    partition: Arc<dyn Partition>,
    vertex_ids: Arc<dyn IdProvider>,
    edge_ids: Arc<dyn IdProvider>,
    query: QueryConfig,
}

impl EdgeResolver {
    pub fn new(
        session: Arc<dyn Session>,
        partition: Arc<dyn Partition>,
        vertex_ids: Arc<dyn IdProvider>,
        edge_ids: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            session,
            partition,
            vertex_ids,
            edge_ids,
            query: QueryConfig::default(),
        }
    }

    pub fn with_query_config(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    /// Builds the partition and identifier providers described by `config`.
    pub fn from_config(session: Arc<dyn Session>, config: &AppConfig) -> Result<Self> {
        let partition = partition_from_config(&config.partition)?;
        let vertex_ids = id_provider_from_config(&config.identifiers.vertex)?;
        let edge_ids = id_provider_from_config(&config.identifiers.edge)?;

        info!(
            partition = ?config.partition.mode,
            vertex_ids = ?config.identifiers.vertex.kind,
            edge_ids = ?config.identifiers.edge.kind,
            "Edge resolver configured"
        );

        Ok(Self::new(session, partition, vertex_ids, edge_ids).with_query_config(config.query.clone()))
    }

    pub fn partition(&self) -> &dyn Partition {
        self.partition.as_ref()
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    /// Renders the remote query `edges` would send for a persisted vertex.
    ///
    /// Every overlay edge for `direction` is excluded whatever its type.
    pub fn build_query(&self, vertex: &Vertex, direction: Direction, types: &[&str]) -> Result<EdgeQuery> {
        self.render_query(vertex, direction, &dedup_types(types))
    }

    fn render_query(&self, vertex: &Vertex, direction: Direction, types: &[String]) -> Result<EdgeQuery> {
        let restriction = TypeRestriction::from_requested(types, self.partition.as_ref());
        if restriction == TypeRestriction::Nothing {
            warn!(
                vertex = %vertex.id(),
                requested = ?types,
                "Partition rejected every requested edge type, remote query will match nothing"
            );
        }

        EdgeQueryBuilder::new(
            &self.query,
            self.partition.as_ref(),
            self.vertex_ids.as_ref(),
            self.edge_ids.as_ref(),
        )
        .from_vertex(vertex.id(), vertex.labels())
        .direction(direction)
        .types(restriction)
        .exclude(vertex.overlay().ids(direction))
        .build()
    }

    /// Edges of `vertex` in `direction`, restricted to `types` (any type when
    /// empty).
    ///
    /// The remote query runs before this returns, so transport failures
    /// surface here; row failures surface through the stream.
    pub async fn edges(&self, vertex: &Vertex, direction: Direction, types: &[&str]) -> Result<EdgeStream> {
        let requested = dedup_types(types);
        let local = vertex.overlay().matching(direction, &requested);

        if vertex.is_transient() {
            debug!(
                vertex = %vertex.id(),
                direction = %direction,
                local = local.len(),
                "Vertex not persisted, resolving edges from overlay only"
            );
            return Ok(EdgeStream::local_only(local));
        }

        let query = self.render_query(vertex, direction, &requested)?;
        let cursor = self
            .session
            .execute_query(&query.text, &query.parameters)
            .await?;

        let projection = EdgeProjection::new(&self.query, self.vertex_ids.clone(), self.edge_ids.clone());
        let remote = RemoteEdges::new(cursor, self.session.clone(), projection);

        Ok(EdgeStream::merged(remote, vertex.overlay().ids(direction), local))
    }
}

/// Requested types without repeats, first occurrence kept.
fn dedup_types(types: &[&str]) -> Vec<String> {
    let mut requested: Vec<String> = Vec::with_capacity(types.len());
    for label in types {
        if !requested.iter().any(|t| t.as_str() == *label) {
            requested.push(label.to_string());
        }
    }
    requested
}

impl std::fmt::Debug for EdgeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeResolver")
            .field("partition", &self.partition)
            .field("vertex_ids", &self.vertex_ids)
            .field("edge_ids", &self.edge_ids)
            .field("query", &self.query)
            .finish()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
