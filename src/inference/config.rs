//! Configuration for schema inference

use serde::{Deserialize, Serialize};

/// Configuration for schema inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceConfig {
    /// Name of the inferred declaration
    pub root_name: String,

    /// Enable format detection (email, uuid, url, date-time)
    pub detect_formats: bool,

    /// Maximum nesting depth for objects and arrays
    pub max_depth: usize,

    /// Mark whole numbers as integers (`z.number().int()`)
    pub integer_checks: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            root_name: "Root".to_string(),
            detect_formats: true,
            max_depth: 32,
            integer_checks: false,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the declaration name
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_name = name.into();
        self
    }

    /// Enable or disable format detection
    pub fn detect_formats(mut self, detect: bool) -> Self {
        self.config.detect_formats = detect;
        self
    }

    /// Set the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn integer_checks(mut self, enabled: bool) -> Self {
        self.config.integer_checks = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.root_name, "Root");
        assert!(config.detect_formats);
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_builder() {
        let config = InferenceConfig::builder()
            .root_name("Payload")
            .detect_formats(false)
            .max_depth(5)
            .integer_checks(true)
            .build();

        assert_eq!(config.root_name, "Payload");
        assert!(!config.detect_formats);
        assert_eq!(config.max_depth, 5);
        assert!(config.integer_checks);
    }
}
