//! Engine configuration.
//!
//! [`XmlConfig`] controls document framing and walk limits. It can be built
//! programmatically or loaded from JSON, with missing fields taking their
//! defaults.
//!
//! | Field | Default | Description |
//! |-------|---------|-------------|
//! | `xml_declaration` | true | Emit `<?xml version="1.0" encoding="UTF-8"?>` before the root |
//! | `indent` | none | Indent nested elements by this many spaces |
//! | `max_depth` | 128 | Maximum nesting of complex values before the walk fails |
//!
//! # Example
//!
//! ```rust
//! use helios_xmlgraph::XmlConfig;
//!
//! let config = XmlConfig {
//!     indent: Some(2),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//!
//! let config = XmlConfig::from_json_str(r#"{"xml_declaration": false}"#).unwrap();
//! assert!(!config.xml_declaration);
//! assert_eq!(config.max_depth, 128);
//! ```

use crate::error::{Result, XmlGraphError};
use serde::{Deserialize, Serialize};

/// Default limit on nested complex values.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration for the XML object graph engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlConfig {
    /// Whether to write the XML declaration before the root element.
    pub xml_declaration: bool,

    /// Indentation width for nested elements; `None` writes a single line.
    pub indent: Option<usize>,

    /// Maximum depth of nested complex values (structs, list items).
    pub max_depth: usize,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            indent: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl XmlConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| XmlGraphError::Config(e.to_string()))?;
        config
            .validate()
            .map_err(|errors| XmlGraphError::Config(errors.join("; ")))?;
        Ok(config)
    }

    /// Sets whether the XML declaration is written.
    pub fn with_xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    /// Sets the indentation width.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Sets the maximum depth of nested complex values.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if self.indent == Some(0) {
            errors.push("Indent width cannot be 0 (use none for a single line)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = XmlConfig::default();
        assert!(config.xml_declaration);
        assert_eq!(config.indent, None);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = XmlConfig::new()
            .with_xml_declaration(false)
            .with_indent(4)
            .with_max_depth(8);
        assert!(!config.xml_declaration);
        assert_eq!(config.indent, Some(4));
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = XmlConfig {
            max_depth: 0,
            indent: Some(0),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_from_json_partial() {
        let config = XmlConfig::from_json_str(r#"{"indent": 2}"#).unwrap();
        assert_eq!(config.indent, Some(2));
        assert!(config.xml_declaration);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = XmlConfig::from_json_str(r#"{"max_depth": 0}"#).unwrap_err();
        assert!(matches!(err, XmlGraphError::Config(_)));
        let err = XmlConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, XmlGraphError::Config(_)));
    }
}
