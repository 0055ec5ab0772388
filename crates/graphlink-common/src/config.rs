use serde::{Deserialize, Serialize};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;

// --- Constants for Default Configuration ---
pub const DEFAULT_CONFIG_FILE: &str = "graphlink";
pub const DEFAULT_ENV_PREFIX: &str = "GRAPHLINK";

pub const DEFAULT_SOURCE_ALIAS: &str = "n";
pub const DEFAULT_RELATIONSHIP_ALIAS: &str = "r";
pub const DEFAULT_RELATED_ALIAS: &str = "m";
pub const DEFAULT_EXCLUSION_PARAMETER: &str = "ids";
pub const DEFAULT_ID_FIELD: &str = "id";

/// Aliases and parameter names used when rendering edge queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    pub source_alias: String,
    pub relationship_alias: String,
    pub related_alias: String,
    pub exclusion_parameter: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            source_alias: DEFAULT_SOURCE_ALIAS.into(),
            relationship_alias: DEFAULT_RELATIONSHIP_ALIAS.into(),
            related_alias: DEFAULT_RELATED_ALIAS.into(),
            exclusion_parameter: DEFAULT_EXCLUSION_PARAMETER.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMode {
    #[default]
    None,
    /// Vertices must carry every partition label.
    AllLabels,
    /// Vertices must carry at least one partition label.
    AnyLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PartitionConfig {
    #[serde(default)]
    pub mode: PartitionMode,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// Store-assigned ids, addressed with `ID(alias)`.
    #[default]
    Native,
    /// Ids kept in a property, addressed with `alias.field`.
    Property,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdProviderConfig {
    #[serde(default)]
    pub kind: IdKind,
    #[serde(default = "default_id_field")]
    pub field: String,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

impl Default for IdProviderConfig {
    fn default() -> Self {
        Self {
            kind: IdKind::Native,
            field: default_id_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IdentifierConfig {
    #[serde(default)]
    pub vertex: IdProviderConfig,
    #[serde(default)]
    pub edge: IdProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub identifiers: IdentifierConfig,
}

impl AppConfig {
    /// Defaults, then `graphlink.toml` (optional), then `GRAPHLINK__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(file_name: &str) -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // File: graphlink.toml
            .add_source(File::with_name(file_name).required(false))
            // Environment: GRAPHLINK__PARTITION__MODE=any_label -> partition.mode=any_label
            .add_source(
                Environment::with_prefix(DEFAULT_ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("partition.labels")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Parses TOML content on top of the defaults. No env overrides.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("query.source_alias", DEFAULT_SOURCE_ALIAS)?
            .set_default("query.relationship_alias", DEFAULT_RELATIONSHIP_ALIAS)?
            .set_default("query.related_alias", DEFAULT_RELATED_ALIAS)?
            .set_default("query.exclusion_parameter", DEFAULT_EXCLUSION_PARAMETER)?
            .set_default("partition.mode", "none")?
            .set_default("partition.labels", Vec::<String>::new())?
            .set_default("identifiers.vertex.kind", "native")?
            .set_default("identifiers.vertex.field", DEFAULT_ID_FIELD)?
            .set_default("identifiers.edge.kind", "native")?
            .set_default("identifiers.edge.field", DEFAULT_ID_FIELD)
    }

    /// Returns true if a partition is configured with at least one label.
    pub fn is_partitioned(&self) -> bool {
        self.partition.mode != PartitionMode::None && !self.partition.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.query.source_alias, "n");
        assert_eq!(config.query.relationship_alias, "r");
        assert_eq!(config.query.related_alias, "m");
        assert_eq!(config.query.exclusion_parameter, "ids");
        assert_eq!(config.partition.mode, PartitionMode::None);
        assert_eq!(config.identifiers.vertex.kind, IdKind::Native);
        assert_eq!(config.identifiers.edge.field, "id");
        assert!(!config.is_partitioned());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [partition]
            mode = "any_label"
            labels = ["Tenant1", "Shared"]

            [identifiers.vertex]
            kind = "property"
            field = "uid"
            "#,
        )
        .expect("valid toml config");

        assert_eq!(config.partition.mode, PartitionMode::AnyLabel);
        assert_eq!(config.partition.labels, vec!["Tenant1".to_string(), "Shared".to_string()]);
        assert_eq!(config.identifiers.vertex.kind, IdKind::Property);
        assert_eq!(config.identifiers.vertex.field, "uid");
        // untouched sections keep their defaults
        assert_eq!(config.identifiers.edge, IdProviderConfig::default());
        assert_eq!(config.query, QueryConfig::default());
        assert!(config.is_partitioned());
    }

    #[test]
    fn test_unknown_partition_mode_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [partition]
            mode = "every_label"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("graphlink-test-config-that-does-not-exist")
            .expect("missing optional file is not an error");
        assert_eq!(config.query, QueryConfig::default());
    }
}
