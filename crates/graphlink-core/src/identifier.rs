use graphlink_common::config::{IdKind, IdProviderConfig};
use graphlink_common::{ElementId, GraphError, Properties, Result};
use std::fmt;
use std::sync::Arc;

/// Maps element identifiers to and from the store's native representation.
///
/// One instance serves vertices and another serves edges; the query builder
/// and the row projection only ever talk to this interface.
pub trait IdProvider: Send + Sync + fmt::Debug {
    fn to_native(&self, id: &ElementId) -> Result<serde_json::Value>;

    fn from_native(&self, native: &serde_json::Value) -> Option<ElementId>;

    /// Parameter name under which the identifier is bound in a query.
    fn field_name(&self) -> &str;

    /// Query-language spelling of "alias.field", e.g. `n.id` or `ID(n)`.
    fn match_operand(&self, alias: &str) -> String;

    /// Reads the identifier of a projected node or relationship.
    fn read_id(&self, native_id: &serde_json::Value, properties: &Properties) -> Option<ElementId>;
}

/// Identifiers assigned by the store itself.
#[derive(Debug, Clone, Default)]
pub struct NativeIdProvider;

impl IdProvider for NativeIdProvider {
    fn to_native(&self, id: &ElementId) -> Result<serde_json::Value> {
        id.as_i64().map(serde_json::Value::from).ok_or_else(|| {
            GraphError::Configuration(format!(
                "native identifiers are integers, cannot map `{}`",
                id
            ))
        })
    }

    fn from_native(&self, native: &serde_json::Value) -> Option<ElementId> {
        native.as_i64().map(ElementId::Number)
    }

    fn field_name(&self) -> &str {
        "id"
    }

    fn match_operand(&self, alias: &str) -> String {
        format!("ID({})", alias)
    }

    fn read_id(&self, native_id: &serde_json::Value, _properties: &Properties) -> Option<ElementId> {
        self.from_native(native_id)
    }
}

/// Identifiers kept in a property of every node/relationship.
#[derive(Debug, Clone)]
pub struct PropertyIdProvider {
    field: String,
}

impl PropertyIdProvider {
    pub fn new(field: impl Into<String>) -> Result<Self> {
        let field = field.into();
        if !is_plain_identifier(&field) {
            return Err(GraphError::Configuration(format!(
                "`{}` is not a valid identifier field name",
                field
            )));
        }
        Ok(Self { field })
    }
}

impl IdProvider for PropertyIdProvider {
    fn to_native(&self, id: &ElementId) -> Result<serde_json::Value> {
        Ok(id.to_json())
    }

    fn from_native(&self, native: &serde_json::Value) -> Option<ElementId> {
        ElementId::from_json(native)
    }

    fn field_name(&self) -> &str {
        &self.field
    }

    fn match_operand(&self, alias: &str) -> String {
        format!("{}.{}", alias, self.field)
    }

    fn read_id(&self, _native_id: &serde_json::Value, properties: &Properties) -> Option<ElementId> {
        properties.get(&self.field).and_then(|value| self.from_native(value))
    }
}

pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn id_provider_from_config(config: &IdProviderConfig) -> Result<Arc<dyn IdProvider>> {
    match config.kind {
        IdKind::Native => Ok(Arc::new(NativeIdProvider)),
        IdKind::Property => Ok(Arc::new(PropertyIdProvider::new(config.field.clone())?)),
    }
}
