//! Conversion configuration
//!
//! Groups the options of every compiler and generator behind one serde
//! struct that can be loaded from TOML:
//!
//! ```toml
//! maxDepth = 16
//!
//! [ddl]
//! tableName = "orders"
//! detectTimestamps = true
//!
//! [insert]
//! onConflict = ["id"]
//! onConflictAction = "update"
//!
//! [mock]
//! seed = 7
//! ```
//!
//! Relational output uses one root table name and key field for both the
//! DDL and the inserts; see [`ConversionConfig::relational_options`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::go::DEFAULT_TYPE_NAME;
use crate::export::sql::DEFAULT_TABLE_NAME;
use crate::export::{DdlOptions, InsertOptions};
use crate::inference::InferenceConfig;
use crate::mock::MockOptions;

/// Errors loading or saving a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Options for a conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionConfig {
    pub ddl: DdlOptions,
    pub insert: InsertOptions,
    pub mock: MockOptions,
    pub inference: InferenceConfig,
    /// Name of the generated Go type
    pub struct_name: String,
    /// Overrides the depth limit of every stage when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ddl: DdlOptions::default(),
            insert: InsertOptions::default(),
            mock: MockOptions::default(),
            inference: InferenceConfig::default(),
            struct_name: DEFAULT_TYPE_NAME.to_string(),
            max_depth: None,
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn ddl_options(&self) -> DdlOptions {
        let mut options = self.ddl.clone();
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        options
    }

    pub fn insert_options(&self) -> InsertOptions {
        let mut options = self.insert.clone();
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        options
    }

    /// DDL and insert options naming the same root table and key.
    ///
    /// `[ddl]` decides both; `[insert]` fills in whatever `[ddl]` leaves at
    /// its default.
    pub fn relational_options(&self) -> (DdlOptions, InsertOptions) {
        let mut ddl = self.ddl_options();
        let mut insert = self.insert_options();
        if ddl.table_name == DEFAULT_TABLE_NAME {
            ddl.table_name = insert.table_name.clone();
        }
        insert.table_name = ddl.table_name.clone();
        let id_field = ddl.id_field.take().or(insert.id_field.take());
        ddl.id_field = id_field.clone();
        insert.id_field = id_field;
        (ddl, insert)
    }

    pub fn mock_options(&self) -> MockOptions {
        let mut options = self.mock.clone();
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        options
    }

    pub fn inference_config(&self) -> InferenceConfig {
        let mut config = self.inference.clone();
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        config
    }
}

/// Builder for ConversionConfig
#[derive(Debug, Default)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Set the root table name for both DDL and inserts
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.config.ddl.table_name = name.clone();
        self.config.insert.table_name = name;
        self
    }

    /// Set the primary key field for both DDL and inserts
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.config.ddl.id_field = Some(field.clone());
        self.config.insert.id_field = Some(field);
        self
    }

    pub fn ddl(mut self, options: DdlOptions) -> Self {
        self.config.ddl = options;
        self
    }

    pub fn insert(mut self, options: InsertOptions) -> Self {
        self.config.insert = options;
        self
    }

    pub fn mock(mut self, options: MockOptions) -> Self {
        self.config.mock = options;
        self
    }

    pub fn inference(mut self, config: InferenceConfig) -> Self {
        self.config.inference = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.mock.seed = Some(seed);
        self
    }

    pub fn struct_name(mut self, name: impl Into<String>) -> Self {
        self.config.struct_name = name.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConversionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ConflictAction, Returning};

    #[test]
    fn test_default_config() {
        let config = ConversionConfig::default();
        assert_eq!(config.ddl.table_name, "generic");
        assert_eq!(config.insert.returning, Returning::All);
        assert_eq!(config.struct_name, "AutoGenerated");
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_from_toml_str() {
        let config = ConversionConfig::from_toml_str(
            r#"
            maxDepth = 6

            [ddl]
            tableName = "orders"
            detectTimestamps = true

            [insert]
            tableName = "orders"
            onConflict = ["id"]
            onConflictAction = "update"
            returning = "none"

            [mock]
            seed = 7
            maxArrayLen = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.ddl.table_name, "orders");
        assert!(config.ddl.detect_timestamps);
        assert_eq!(config.insert.on_conflict, vec!["id".to_string()]);
        assert_eq!(config.insert.on_conflict_action, ConflictAction::Update);
        assert_eq!(config.insert.returning, Returning::None);
        assert_eq!(config.mock.seed, Some(7));
        assert_eq!(config.mock.max_array_len, 2);
        assert_eq!(config.mock.min_array_len, 1);

        assert_eq!(config.ddl_options().max_depth, 6);
        assert_eq!(config.insert_options().max_depth, 6);
        assert_eq!(config.mock_options().max_depth, 6);
        assert_eq!(config.inference_config().max_depth, 6);
    }

    #[test]
    fn test_relational_options_share_table_and_key() {
        let config = ConversionConfig::from_toml_str(
            "[ddl]\ntableName = \"orders\"\n\n[insert]\nidField = \"orderId\"\n",
        )
        .unwrap();
        let (ddl, insert) = config.relational_options();
        assert_eq!(ddl.table_name, "orders");
        assert_eq!(insert.table_name, "orders");
        assert_eq!(ddl.id_field.as_deref(), Some("orderId"));
        assert_eq!(insert.id_field.as_deref(), Some("orderId"));

        let config = ConversionConfig::from_toml_str("[insert]\ntableName = \"events\"\n").unwrap();
        let (ddl, insert) = config.relational_options();
        assert_eq!(ddl.table_name, "events");
        assert_eq!(insert.table_name, "events");
    }

    #[test]
    fn test_invalid_toml() {
        let err = ConversionConfig::from_toml_str("[ddl]\ntableName = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_builder_and_round_trip() {
        let config = ConversionConfig::builder()
            .table_name("users")
            .id_field("userId")
            .seed(3)
            .struct_name("User")
            .build();
        assert_eq!(config.insert.table_name, "users");
        assert_eq!(config.ddl.id_field.as_deref(), Some("userId"));

        let text = config.to_toml_string().unwrap();
        let back = ConversionConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.ddl, config.ddl);
        assert_eq!(back.mock, config.mock);
        assert_eq!(back.struct_name, "User");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ConversionConfig::from_file(Path::new("/nonexistent/convert.toml")).unwrap();
        assert_eq!(config.ddl.table_name, "generic");
    }
}
