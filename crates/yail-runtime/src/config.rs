//! Runtime configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use yail_core::{Coercer, ComponentRegistry, ComponentSchema, SchemaError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("component schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Settings for one interpreter instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// IANA zone used to read and display instants.
    pub time_zone: String,
    /// Maximum nesting of evaluation before a recursion error is raised.
    pub max_depth: usize,
    /// Screen that exists before any `define-form`.
    pub default_screen: String,
    /// Extra component types loaded on top of the bundled ones.
    pub component_schema: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            max_depth: 512,
            default_screen: "Screen1".to_string(),
            component_schema: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse a TOML document holding the runtime settings at top level.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn coercer(&self) -> Result<Coercer, ConfigError> {
        Coercer::with_zone_name(&self.time_zone)
            .ok_or_else(|| ConfigError::UnknownTimeZone(self.time_zone.clone()))
    }

    /// Bundled component types plus the configured schema, if any.
    pub fn component_registry(&self, coercer: &Coercer) -> Result<ComponentRegistry, ConfigError> {
        let mut registry = ComponentRegistry::with_builtins(coercer)?;
        if let Some(path) = &self.component_schema {
            registry.load_schema(&ComponentSchema::from_file(path)?, coercer)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_depth, 512);
        assert_eq!(config.default_screen, "Screen1");
        assert!(config.coercer().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = RuntimeConfig::parse("time_zone = \"Asia/Tokyo\"").unwrap();
        assert_eq!(config.time_zone, "Asia/Tokyo");
        assert_eq!(config.max_depth, 512);
    }

    #[test]
    fn test_unknown_zone() {
        let config = RuntimeConfig {
            time_zone: "Nowhere/Special".into(),
            ..Default::default()
        };
        assert!(matches!(config.coercer(), Err(ConfigError::UnknownTimeZone(_))));
    }

    #[test]
    fn test_extra_schema_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[component]]\nname = \"Slider\"\n[[component.property]]\nname = \"ThumbPosition\"\ntype = \"number\"\ndefault = \"50\""
        )
        .unwrap();

        let config = RuntimeConfig {
            component_schema: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let registry = config.component_registry(&Coercer::default()).unwrap();
        assert!(registry.resolve("Slider").is_some());
        assert!(registry.resolve("Button").is_some());
    }
}
