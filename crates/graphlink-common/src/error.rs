use crate::ElementId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Invalid partition predicate, identifier mapping or query aliases.
    /// Fatal; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure or a query rejected by the remote store.
    #[error("remote fetch failed: {0}")]
    Fetch(#[source] anyhow::Error),

    /// A result row did not have the shape the projection expects.
    #[error("projection error on column `{column}`: {reason}")]
    Projection { column: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("edge {id} is already registered with type `{existing}`, cannot add it as `{requested}`")]
    EdgeTypeConflict {
        id: ElementId,
        existing: String,
        requested: String,
    },

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl GraphError {
    pub fn fetch(err: impl Into<anyhow::Error>) -> Self {
        GraphError::Fetch(err.into())
    }

    pub fn projection(column: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::Projection {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Configuration problems are surfaced immediately and must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GraphError::Configuration(_) | GraphError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_keeps_source_message() {
        let err = GraphError::fetch(anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "remote fetch failed: connection reset");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_configuration_is_fatal() {
        assert!(GraphError::Configuration("bad predicate".into()).is_fatal());
        assert!(!GraphError::projection("r", "missing").is_fatal());
    }
}
