// Edge Query Builder - renders the Cypher traversal used to fetch a vertex's
// persisted edges, scoped by partition and minus the edges already in the overlay

use crate::identifier::{is_plain_identifier, IdProvider};
use crate::partition::Partition;
use graphlink_common::config::QueryConfig;
use graphlink_common::{Direction, ElementId, GraphError, Parameters, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Relationship type restriction sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRestriction {
    /// No filter was requested.
    Any,
    /// Only these types, in caller order.
    Only(Vec<String>),
    /// A filter was requested but the partition rejected every type.
    Nothing,
}

impl TypeRestriction {
    /// Drops types the partition rejects. An empty request means no
    /// restriction; a non-empty request with nothing left matches nothing.
    pub fn from_requested(requested: &[String], partition: &dyn Partition) -> Self {
        if requested.is_empty() {
            return TypeRestriction::Any;
        }
        let mut allowed: Vec<String> = Vec::with_capacity(requested.len());
        for label in requested {
            if partition.is_type_allowed(label) && !allowed.contains(label) {
                allowed.push(label.clone());
            }
        }
        if allowed.is_empty() {
            TypeRestriction::Nothing
        } else {
            TypeRestriction::Only(allowed)
        }
    }
}

/// A rendered query plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeQuery {
    pub text: String,
    pub parameters: Parameters,
}

/// Backtick-quotes a label or relationship type.
pub fn quote_label(label: &str) -> String {
    format!("`{}`", label.replace('`', "``"))
}

/// Edge query builder
pub struct EdgeQueryBuilder<'a> {
    config: &'a QueryConfig,
    partition: &'a dyn Partition,
    vertex_ids: &'a dyn IdProvider,
    edge_ids: &'a dyn IdProvider,
    vertex: Option<(&'a ElementId, &'a BTreeSet<String>)>,
    direction: Direction,
    types: TypeRestriction,
    excluded: BTreeSet<ElementId>,
}

impl<'a> EdgeQueryBuilder<'a> {
    pub fn new(
        config: &'a QueryConfig,
        partition: &'a dyn Partition,
        vertex_ids: &'a dyn IdProvider,
        edge_ids: &'a dyn IdProvider,
    ) -> Self {
        Self {
            config,
            partition,
            vertex_ids,
            edge_ids,
            vertex: None,
            direction: Direction::Both,
            types: TypeRestriction::Any,
            excluded: BTreeSet::new(),
        }
    }

    /// The persisted vertex the traversal starts from.
    pub fn from_vertex(mut self, id: &'a ElementId, labels: &'a BTreeSet<String>) -> Self {
        self.vertex = Some((id, labels));
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn types(mut self, types: TypeRestriction) -> Self {
        self.types = types;
        self
    }

    /// Edge identifiers the store must not return.
    pub fn exclude<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ElementId>,
    {
        self.excluded.extend(ids);
        self
    }

    pub fn build(self) -> Result<EdgeQuery> {
        let (vertex_id, vertex_labels) = self.vertex.ok_or_else(|| {
            GraphError::InvalidArgument("edge query requires a persisted source vertex".to_string())
        })?;

        let source = self.alias(&self.config.source_alias, "source")?;
        let relationship = self.alias(&self.config.relationship_alias, "relationship")?;
        let related = self.alias(&self.config.related_alias, "related")?;
        let exclusion_parameter = self.config.exclusion_parameter.as_str();
        if !is_plain_identifier(exclusion_parameter) {
            return Err(GraphError::Configuration(format!(
                "`{}` is not a valid exclusion parameter name",
                exclusion_parameter
            )));
        }

        let vertex_field = checked_field(self.vertex_ids)?;
        let vertex_operand = checked_operand(self.vertex_ids, source)?;

        // Partition match labels are unioned into the source pattern and
        // repeated on the related node
        let match_labels = self.partition.related_vertex_match_labels();
        let source_labels: BTreeSet<&String> = vertex_labels.iter().chain(match_labels.iter()).collect();

        let mut predicates = vec![format!("{} = ${}", vertex_operand, vertex_field)];
        let mut parameters = Parameters::new();
        parameters.insert(vertex_field.to_string(), self.vertex_ids.to_native(vertex_id)?);

        if !self.excluded.is_empty() {
            let edge_operand = checked_operand(self.edge_ids, relationship)?;
            predicates.push(format!("NOT {} IN ${}", edge_operand, exclusion_parameter));
            let ids = self
                .excluded
                .iter()
                .map(|id| self.edge_ids.to_native(id))
                .collect::<Result<Vec<_>>>()?;
            parameters.insert(exclusion_parameter.to_string(), serde_json::Value::Array(ids));
        }

        if match_labels.is_empty() {
            if let Some(predicate) = self.partition.related_vertex_predicate(related) {
                validate_predicate(&predicate)?;
                predicates.push(predicate);
            }
        }

        let relationship_types = match &self.types {
            TypeRestriction::Only(types) => types
                .iter()
                .map(|t| quote_label(t))
                .collect::<Vec<_>>()
                .join("|"),
            TypeRestriction::Any | TypeRestriction::Nothing => String::new(),
        };
        if self.types == TypeRestriction::Nothing {
            predicates.push("false".to_string());
        }

        let (left, right) = match self.direction {
            Direction::Outgoing => ("-", "->"),
            Direction::Incoming => ("<-", "-"),
            Direction::Both => ("-", "-"),
        };

        let text = format!(
            "MATCH ({}{}){}[{}{}]{}({}{}) WHERE {} RETURN {}, {}, {}",
            source,
            label_pattern(source_labels),
            left,
            relationship,
            if relationship_types.is_empty() {
                String::new()
            } else {
                format!(":{}", relationship_types)
            },
            right,
            related,
            label_pattern(match_labels.iter()),
            predicates.join(" AND "),
            source,
            relationship,
            related,
        );

        tracing::debug!(
            query = %text,
            parameters = parameters.len(),
            excluded = self.excluded.len(),
            "Built edge query"
        );

        Ok(EdgeQuery { text, parameters })
    }

    fn alias<'s>(&self, alias: &'s str, role: &str) -> Result<&'s str> {
        if is_plain_identifier(alias) {
            Ok(alias)
        } else {
            Err(GraphError::Configuration(format!(
                "`{}` is not a valid {} alias",
                alias, role
            )))
        }
    }
}

fn label_pattern<'l>(labels: impl IntoIterator<Item = &'l String>) -> String {
    labels
        .into_iter()
        .map(|label| format!(":{}", quote_label(label)))
        .collect()
}

fn checked_field(provider: &dyn IdProvider) -> Result<&str> {
    let field = provider.field_name();
    if is_plain_identifier(field) {
        Ok(field)
    } else {
        Err(GraphError::Configuration(format!(
            "identifier provider has no usable field name (got `{}`)",
            field
        )))
    }
}

fn checked_operand(provider: &dyn IdProvider, alias: &str) -> Result<String> {
    let operand = provider.match_operand(alias);
    if operand.trim().is_empty() {
        return Err(GraphError::Configuration(format!(
            "identifier provider has no match operand for alias `{}`",
            alias
        )));
    }
    Ok(operand)
}

/// Rejects blank predicates and predicates with unbalanced parentheses,
/// backticks or quotes. Quotes inside `'` and `"` literals may be escaped
/// with a backslash.
pub fn validate_predicate(predicate: &str) -> Result<()> {
    if predicate.trim().is_empty() {
        return Err(GraphError::Configuration("partition predicate is blank".to_string()));
    }

    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in predicate.chars() {
        match quote {
            // Backslash escapes apply inside string literals only
            Some(open) if open != '`' && escaped => escaped = false,
            Some(open) if open != '`' && c == '\\' => escaped = true,
            Some(open) => {
                if c == open {
                    quote = None;
                }
            }
            None => match c {
                '`' | '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        break;
                    }
                }
                _ => {}
            },
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(GraphError::Configuration(format!(
            "malformed partition predicate: {}",
            predicate
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "query_builder_tests.rs"]
mod query_builder_tests;
