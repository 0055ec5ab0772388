use crate::identifier::IdProvider;
use async_trait::async_trait;
use futures::Stream;
use graphlink_common::config::QueryConfig;
use graphlink_common::{Edge, NodeValue, Parameters, Record, RelationshipValue, Result, GraphError};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Lazily pulled rows of an executed query.
///
/// `consume` releases whatever the cursor holds on the store side. The edge
/// stream calls it exactly once, on exhaustion, on error or when dropped.
pub trait ResultCursor: Stream<Item = Result<Record>> + Send + Unpin {
    fn consume(&mut self);
}

pub type ResultHandle = Box<dyn ResultCursor>;

/// Transport to the remote graph store.
#[async_trait]
pub trait Session: Send + Sync {
    /// Sends the query. Failures surface as `GraphError::Fetch`.
    async fn execute_query(&self, query: &str, parameters: &Parameters) -> Result<ResultHandle>;

    /// Maps one `RETURN source, relationship, related` row to an edge.
    fn edge_from_record(&self, record: &Record, projection: &EdgeProjection) -> Result<Edge> {
        projection.project(record)
    }
}

/// Cursor over rows that were fetched in one go, e.g. from an HTTP
/// transaction endpoint.
pub struct RecordCursor {
    rows: VecDeque<Result<Record>>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl RecordCursor {
    pub fn new(rows: impl IntoIterator<Item = Result<Record>>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            on_release: None,
        }
    }

    /// Hook run when the cursor is consumed.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn into_handle(self) -> ResultHandle {
        Box::new(self)
    }
}

impl Stream for RecordCursor {
    type Item = Result<Record>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.rows.pop_front())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}

impl ResultCursor for RecordCursor {
    fn consume(&mut self) {
        self.rows.clear();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

/// Reads edges out of `source, relationship, related` rows.
#[derive(Clone)]
pub struct EdgeProjection {
    source_alias: String,
    relationship_alias: String,
    related_alias: String,
    vertex_ids: Arc<dyn IdProvider>,
    edge_ids: Arc<dyn IdProvider>,
}

impl EdgeProjection {
    pub fn new(config: &QueryConfig, vertex_ids: Arc<dyn IdProvider>, edge_ids: Arc<dyn IdProvider>) -> Self {
        Self {
            source_alias: config.source_alias.clone(),
            relationship_alias: config.relationship_alias.clone(),
            related_alias: config.related_alias.clone(),
            vertex_ids,
            edge_ids,
        }
    }

    /// Fails on the first missing or mis-shaped column; rows are never
    /// silently skipped.
    pub fn project(&self, record: &Record) -> Result<Edge> {
        let source = self.node(record, &self.source_alias)?;
        let relationship = self.relationship(record)?;
        let related = self.node(record, &self.related_alias)?;

        // The undirected pattern binds the source vertex to either endpoint
        let (start, end) = if relationship.start == source.id && relationship.end == related.id {
            (source, related)
        } else if relationship.start == related.id && relationship.end == source.id {
            (related, source)
        } else {
            return Err(GraphError::projection(
                &self.relationship_alias,
                "relationship does not connect the projected nodes",
            ));
        };

        let id = self
            .edge_ids
            .read_id(&relationship.id, &relationship.properties)
            .ok_or_else(|| GraphError::projection(&self.relationship_alias, "relationship has no identifier"))?;
        let source_id = self.vertex_id(start, self.alias_of(start, source))?;
        let target_id = self.vertex_id(end, self.alias_of(end, source))?;

        Ok(Edge {
            id,
            label: relationship.rel_type.clone(),
            source_id,
            target_id,
            properties: relationship.properties.clone(),
        })
    }

    fn node<'r>(&self, record: &'r Record, alias: &str) -> Result<&'r NodeValue> {
        let value = record.column(alias)?;
        value.as_node().ok_or_else(|| {
            GraphError::projection(alias, format!("expected a node, found a {}", value.kind()))
        })
    }

    fn relationship<'r>(&self, record: &'r Record) -> Result<&'r RelationshipValue> {
        let value = record.column(&self.relationship_alias)?;
        value.as_relationship().ok_or_else(|| {
            GraphError::projection(
                &self.relationship_alias,
                format!("expected a relationship, found a {}", value.kind()),
            )
        })
    }

    fn alias_of(&self, node: &NodeValue, source: &NodeValue) -> &str {
        if std::ptr::eq(node, source) {
            &self.source_alias
        } else {
            &self.related_alias
        }
    }

    fn vertex_id(&self, node: &NodeValue, alias: &str) -> Result<graphlink_common::ElementId> {
        self.vertex_ids
            .read_id(&node.id, &node.properties)
            .ok_or_else(|| GraphError::projection(alias, "node has no identifier"))
    }
}

impl std::fmt::Debug for EdgeProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeProjection")
            .field("source_alias", &self.source_alias)
            .field("relationship_alias", &self.relationship_alias)
            .field("related_alias", &self.related_alias)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{NativeIdProvider, PropertyIdProvider};
    use crate::testing::{node, relationship, row};
    use futures::StreamExt;
    use graphlink_common::{ElementId, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn projection() -> EdgeProjection {
        let ids: Arc<dyn IdProvider> = Arc::new(PropertyIdProvider::new("id").expect("field"));
        EdgeProjection::new(&QueryConfig::default(), ids.clone(), ids)
    }

    #[test]
    fn test_project_outgoing_row() {
        let edge = projection()
            .project(&row(node(1, &["l1"]), relationship(100, "EL1", 1, 2), node(2, &["l2"])))
            .expect("edge");
        assert_eq!(edge.id, ElementId::from(100));
        assert_eq!(edge.label, "EL1");
        assert_eq!(edge.source_id, ElementId::from(1));
        assert_eq!(edge.target_id, ElementId::from(2));
    }

    #[test]
    fn test_project_incoming_row() {
        let edge = projection()
            .project(&row(node(1, &["l1"]), relationship(300, "EL1", 3, 1), node(3, &["l2"])))
            .expect("edge");
        assert_eq!(edge.source_id, ElementId::from(3));
        assert_eq!(edge.target_id, ElementId::from(1));
    }

    #[test]
    fn test_project_loop_row() {
        let edge = projection()
            .project(&row(node(1, &["l1"]), relationship(7, "SELF", 1, 1), node(1, &["l1"])))
            .expect("edge");
        assert!(edge.is_loop());
    }

    #[test]
    fn test_native_projection() {
        let ids: Arc<dyn IdProvider> = Arc::new(NativeIdProvider);
        let projection = EdgeProjection::new(&QueryConfig::default(), ids.clone(), ids);
        let edge = projection
            .project(&row(node(1, &["l1"]), relationship(100, "EL1", 1, 2), node(2, &[])))
            .expect("edge");
        assert_eq!(edge.id, ElementId::from(100));
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let record = Record::default()
            .with("n", node(1, &["l1"]))
            .with("r", relationship(100, "EL1", 1, 2));

        match projection().project(&record) {
            Err(GraphError::Projection { column, .. }) => assert_eq!(column, "m"),
            other => panic!("expected projection error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_fails_fast() {
        let record = row(
            node(1, &["l1"]),
            Value::Scalar(serde_json::json!(100)),
            node(2, &["l2"]),
        );
        match projection().project(&record) {
            Err(GraphError::Projection { column, reason }) => {
                assert_eq!(column, "r");
                assert!(reason.contains("scalar"));
            }
            other => panic!("expected projection error, got {:?}", other),
        }
    }

    #[test]
    fn test_disconnected_relationship_fails() {
        let record = row(node(1, &["l1"]), relationship(100, "EL1", 5, 6), node(2, &["l2"]));
        assert!(matches!(
            projection().project(&record),
            Err(GraphError::Projection { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_cursor_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut cursor = RecordCursor::new(vec![Ok(Record::default()), Ok(Record::default())])
            .on_release(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(cursor.size_hint(), (2, Some(2)));
        assert!(cursor.next().await.is_some());
        cursor.consume();
        cursor.consume();

        assert!(cursor.next().await.is_none());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
