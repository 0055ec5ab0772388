// Read partitions - scope every edge query and cached element to a tenant's labels

use crate::graph::query_builder::quote_label;
use graphlink_common::config::{PartitionConfig, PartitionMode};
use graphlink_common::{GraphError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Visibility policy applied to every edge query.
pub trait Partition: Send + Sync + fmt::Debug {
    /// Whether `label` may be used as an edge type filter. Rejected types are
    /// dropped from the query rather than failing the call.
    fn is_type_allowed(&self, label: &str) -> bool;

    /// Labels every related vertex must carry, rendered in the match pattern.
    fn related_vertex_match_labels(&self) -> BTreeSet<String>;

    /// Boolean expression over `alias` restricting related vertices, used when
    /// the partition cannot be expressed as a label pattern.
    fn related_vertex_predicate(&self, alias: &str) -> Option<String>;
}

/// No partitioning: every type is allowed and queries are not restricted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPartition;

impl Partition for NoPartition {
    fn is_type_allowed(&self, _label: &str) -> bool {
        true
    }

    fn related_vertex_match_labels(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn related_vertex_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// Vertices belong to the partition only when they carry every label.
#[derive(Debug, Clone)]
pub struct AllLabelsPartition {
    labels: BTreeSet<String>,
}

impl AllLabelsPartition {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }
}

impl Partition for AllLabelsPartition {
    // Partition labels are reserved, never usable as edge types
    fn is_type_allowed(&self, label: &str) -> bool {
        !self.labels.contains(label)
    }

    fn related_vertex_match_labels(&self) -> BTreeSet<String> {
        self.labels.clone()
    }

    fn related_vertex_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// Vertices belong to the partition when they carry at least one label.
///
/// A disjunction cannot be written as a label pattern, so this partition
/// contributes a predicate like ``(m:`A` OR m:`B`)`` instead.
#[derive(Debug, Clone)]
pub struct AnyLabelPartition {
    labels: BTreeSet<String>,
}

impl AnyLabelPartition {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }
}

impl Partition for AnyLabelPartition {
    fn is_type_allowed(&self, label: &str) -> bool {
        !self.labels.contains(label)
    }

    fn related_vertex_match_labels(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn related_vertex_predicate(&self, alias: &str) -> Option<String> {
        if self.labels.is_empty() {
            return None;
        }
        let terms = self
            .labels
            .iter()
            .map(|label| format!("{}:{}", alias, quote_label(label)))
            .collect::<Vec<_>>()
            .join(" OR ");
        Some(format!("({})", terms))
    }
}

pub fn partition_from_config(config: &PartitionConfig) -> Result<Arc<dyn Partition>> {
    if config.labels.iter().any(|label| label.trim().is_empty()) {
        return Err(GraphError::Configuration(
            "partition labels must not be blank".to_string(),
        ));
    }

    match config.mode {
        PartitionMode::None => Ok(Arc::new(NoPartition)),
        PartitionMode::AllLabels | PartitionMode::AnyLabel if config.labels.is_empty() => {
            Err(GraphError::Configuration(format!(
                "partition mode {:?} requires at least one label",
                config.mode
            )))
        }
        PartitionMode::AllLabels => Ok(Arc::new(AllLabelsPartition::new(config.labels.iter().cloned()))),
        PartitionMode::AnyLabel => Ok(Arc::new(AnyLabelPartition::new(config.labels.iter().cloned()))),
    }
}
