use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

pub mod config;
pub mod error;

pub use error::{GraphError, Result};

/// Named query parameters, ordered so that logged parameter maps are stable.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Property map carried by nodes, relationships and edges.
pub type Properties = HashMap<String, serde_json::Value>;

/// Opaque element identifier.
///
/// Ordering and hashing are total so identifiers can key overlay sets and
/// produce a deterministic exclusion list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Number(i64),
    Uuid(Uuid),
    Text(String),
}

impl ElementId {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ElementId::Number(n) => serde_json::Value::from(*n),
            ElementId::Uuid(u) => serde_json::Value::String(u.to_string()),
            ElementId::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Reads an identifier back from its JSON form. Strings that parse as a
    /// UUID become `ElementId::Uuid`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(ElementId::Number),
            serde_json::Value::String(s) => Some(ElementId::parse(s)),
            _ => None,
        }
    }

    /// Strings that parse as a UUID become `ElementId::Uuid`, anything else
    /// is kept as text. Every string conversion goes through here so an id
    /// read from a row equals the same id built locally.
    pub fn parse(value: &str) -> Self {
        Uuid::parse_str(value)
            .map(ElementId::Uuid)
            .unwrap_or_else(|_| ElementId::Text(value.to_string()))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ElementId::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Number(n) => write!(f, "{}", n),
            ElementId::Uuid(u) => write!(f, "{}", u),
            ElementId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ElementId {
    fn from(value: i64) -> Self {
        ElementId::Number(value)
    }
}

impl From<i32> for ElementId {
    fn from(value: i32) -> Self {
        ElementId::Number(value as i64)
    }
}

impl From<Uuid> for ElementId {
    fn from(value: Uuid) -> Self {
        ElementId::Uuid(value)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        ElementId::parse(value)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        match Uuid::parse_str(&value) {
            Ok(uuid) => ElementId::Uuid(uuid),
            Err(_) => ElementId::Text(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl Direction {
    pub fn includes_outgoing(&self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Both)
    }

    pub fn includes_incoming(&self) -> bool {
        matches!(self, Direction::Incoming | Direction::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
            Direction::Both => "both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed relationship between exactly two vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: ElementId,
    pub label: String,
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    pub fn new(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        source: impl Into<ElementId>,
        target: impl Into<ElementId>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source_id: source.into(),
            target_id: target.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Loop edges start and end on the same vertex.
    pub fn is_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// A node as returned by the remote store. `id` is the store's native id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    pub id: serde_json::Value,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// A relationship as returned by the remote store. `start` and `end` hold the
/// native ids of its endpoint nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipValue {
    pub id: serde_json::Value,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start: serde_json::Value,
    pub end: serde_json::Value,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Value {
    Node(NodeValue),
    Relationship(RelationshipValue),
    Scalar(serde_json::Value),
}

impl Value {
    pub fn as_node(&self) -> Option<&NodeValue> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipValue> {
        match self {
            Value::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Node(_) => "node",
            Value::Relationship(_) => "relationship",
            Value::Scalar(_) => "scalar",
        }
    }
}

/// One result row: aliased columns in projection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn with(mut self, alias: impl Into<String>, value: Value) -> Self {
        self.columns.push((alias.into(), value));
        self
    }

    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    /// Like `get`, but a missing column is a projection failure.
    pub fn column(&self, alias: &str) -> Result<&Value> {
        self.get(alias).ok_or_else(|| GraphError::Projection {
            column: alias.to_string(),
            reason: "column missing from result row".to_string(),
        })
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_json_forms() {
        assert_eq!(ElementId::from(7).to_json(), serde_json::json!(7));
        assert_eq!(ElementId::from_json(&serde_json::json!(7)), Some(ElementId::Number(7)));

        let uuid = Uuid::new_v4();
        let parsed = ElementId::from_json(&serde_json::json!(uuid.to_string()));
        assert_eq!(parsed, Some(ElementId::Uuid(uuid)));

        assert_eq!(
            ElementId::from_json(&serde_json::json!("edge-1")),
            Some(ElementId::Text("edge-1".into()))
        );
        assert_eq!(ElementId::from_json(&serde_json::json!(1.5)), None);
        assert_eq!(ElementId::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_string_conversions_agree_with_json() {
        let text = "550e8400-e29b-41d4-a716-446655440000";
        let from_row = ElementId::from_json(&serde_json::json!(text)).expect("string id");

        assert_eq!(ElementId::from(text), from_row);
        assert_eq!(ElementId::from(text.to_string()), from_row);
        assert!(matches!(from_row, ElementId::Uuid(_)));
        assert_eq!(from_row.to_json(), serde_json::json!(text));

        assert_eq!(ElementId::from("edge-1"), ElementId::Text("edge-1".into()));
        assert_eq!(ElementId::from("edge-1".to_string()), ElementId::Text("edge-1".into()));
    }

    #[test]
    fn test_element_id_ordering_is_stable() {
        let mut ids = vec![ElementId::from(400), ElementId::from(200), ElementId::from(300)];
        ids.sort();
        assert_eq!(ids, vec![ElementId::from(200), ElementId::from(300), ElementId::from(400)]);
    }

    #[test]
    fn test_direction_inclusion() {
        assert!(Direction::Both.includes_outgoing());
        assert!(Direction::Both.includes_incoming());
        assert!(Direction::Outgoing.includes_outgoing());
        assert!(!Direction::Outgoing.includes_incoming());
        assert!(!Direction::Incoming.includes_outgoing());

        let json = serde_json::to_string(&Direction::Incoming).expect("serialize direction");
        assert_eq!(json, "\"incoming\"");
    }

    #[test]
    fn test_record_column_lookup() {
        let record = Record::default()
            .with("n", Value::Scalar(serde_json::json!(1)))
            .with("r", Value::Scalar(serde_json::json!(2)));

        assert_eq!(record.len(), 2);
        assert_eq!(record.aliases().collect::<Vec<_>>(), vec!["n", "r"]);
        assert!(record.get("m").is_none());

        match record.column("m") {
            Err(GraphError::Projection { column, .. }) => assert_eq!(column, "m"),
            other => panic!("expected projection error, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_edge() {
        assert!(Edge::new(1, "SELF", 10, 10).is_loop());
        assert!(!Edge::new(2, "KNOWS", 10, 11).is_loop());
    }
}
