//! CLI configuration file.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use yail_runtime::{ConfigError, RuntimeConfig};

/// Contents of a `yail.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "yail=info".to_string(),
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config.runtime, RuntimeConfig::default());
        assert_eq!(config.logging.filter, "yail=info");
    }

    #[test]
    fn test_load_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[runtime]
time_zone = "Europe/Berlin"
max_depth = 64

[logging]
filter = "yail=debug"
"#
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.runtime.time_zone, "Europe/Berlin");
        assert_eq!(config.runtime.max_depth, 64);
        assert_eq!(config.runtime.default_screen, "Screen1");
        assert_eq!(config.logging.filter, "yail=debug");
    }

    #[test]
    fn test_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runtime]\nmax_depth = \"deep\"").unwrap();
        assert!(matches!(CliConfig::load(Some(file.path())), Err(ConfigError::Toml(_))));
    }
}
