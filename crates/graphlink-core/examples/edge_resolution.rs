use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use graphlink_common::{NodeValue, Parameters, RelationshipValue};
use graphlink_core::{
    AppConfig, Direction, Edge, EdgeResolver, Record, RecordCursor, ResultHandle, Session, Value, Vertex,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Store holding two persisted `KNOWS` edges of vertex 1.
struct ScriptedSession;

fn node(id: i64, label: &str) -> Value {
    Value::Node(NodeValue {
        id: json!(id),
        labels: vec![label.to_string(), "Tenant".to_string()],
        properties: HashMap::from([("uid".to_string(), json!(id))]),
    })
}

fn relationship(id: i64, rel_type: &str, start: i64, end: i64) -> Value {
    Value::Relationship(RelationshipValue {
        id: json!(id),
        rel_type: rel_type.to_string(),
        start: json!(start),
        end: json!(end),
        properties: HashMap::from([("uid".to_string(), json!(id))]),
    })
}

#[async_trait]
impl Session for ScriptedSession {
    async fn execute_query(&self, query: &str, parameters: &Parameters) -> graphlink_core::Result<ResultHandle> {
        println!("   ↳ {}", query);
        println!("     params: {}", serde_json::to_string(parameters).unwrap_or_default());

        let typed = query.contains("[r:");
        let rows = if query.contains(" AND false ") || (typed && !query.contains("`KNOWS`")) {
            Vec::new()
        } else {
            vec![
                Record::default()
                    .with("n", node(1, "Person"))
                    .with("r", relationship(100, "KNOWS", 1, 2))
                    .with("m", node(2, "Person")),
                Record::default()
                    .with("n", node(1, "Person"))
                    .with("r", relationship(300, "KNOWS", 3, 1))
                    .with("m", node(3, "Person")),
            ]
        };
        Ok(RecordCursor::new(rows.into_iter().map(Ok))
            .on_release(|| println!("   ↳ cursor released"))
            .into_handle())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Starting graphlink edge resolution example...");

    let config = AppConfig::from_toml_str(
        r#"
        [partition]
        mode = "all_labels"
        labels = ["Tenant"]

        [identifiers.vertex]
        kind = "property"
        field = "uid"

        [identifiers.edge]
        kind = "property"
        field = "uid"
        "#,
    )?;
    let resolver = EdgeResolver::from_config(Arc::new(ScriptedSession), &config)?;

    // 1. A vertex that only exists locally never reaches the store
    let mut vertex = Vertex::transient(1, ["Person"]);
    vertex.add_out_edge(Edge::new(200, "LIKES", 1, 2))?;
    vertex.add_in_edge(Edge::new(400, "LIKES", 3, 1))?;

    println!("\n📥 Transient vertex, both directions:");
    let edges: Vec<Edge> = resolver.edges(&vertex, Direction::Both, &[]).await?.try_collect().await?;
    print_edges(&edges);

    // 2. Once persisted, remote edges are merged in and the overlay is excluded
    vertex.mark_persisted();

    println!("\n🔍 Persisted vertex, both directions:");
    let edges: Vec<Edge> = resolver.edges(&vertex, Direction::Both, &[]).await?.try_collect().await?;
    print_edges(&edges);

    println!("\n🔍 Persisted vertex, LIKES only:");
    let edges: Vec<Edge> = resolver
        .edges(&vertex, Direction::Both, &["LIKES"])
        .await?
        .try_collect()
        .await?;
    print_edges(&edges);

    // 3. Partition labels are reserved and never used as edge types
    println!("\n🛡️  Partition label requested as an edge type:");
    let edges: Vec<Edge> = resolver
        .edges(&vertex, Direction::Outgoing, &["Tenant"])
        .await?
        .try_collect()
        .await?;
    print_edges(&edges);

    println!("\n✅ Done.");
    Ok(())
}

fn print_edges(edges: &[Edge]) {
    if edges.is_empty() {
        println!("   (no edges)");
    }
    for edge in edges {
        println!(
            "   - {} [{}] {} -> {}",
            edge.id, edge.label, edge.source_id, edge.target_id
        );
    }
}
