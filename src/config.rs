//! YAML configuration for the highlighter.
//!
//! Every section is optional; missing sections and fields take the defaults
//! shown below.
//!
//! ```yaml
//! version: "1.0"
//!
//! anchor:
//!   context_window: 50
//!   search_window: 100
//!   strong_context_len: 30
//!   weak_context_len: 15
//!   strong_bonus: 20
//!   weak_bonus: 10
//!   length_tolerance: 5
//!
//! restore:
//!   quiet_period_ms: 500
//!   min_mutation_text_len: 20
//!
//! storage:
//!   backend: "in_memory"   # or "redb"
//!   path: null             # required for redb
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anchor::AnchorConfig;
use serde::{Deserialize, Serialize};
use store::BackendConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MarkyConfig {
    pub version: String,

    #[serde(default)]
    pub anchor: AnchorConfig,

    #[serde(default)]
    pub restore: RestoreYamlConfig,

    #[serde(default)]
    pub storage: StorageYamlConfig,
}

impl MarkyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: MarkyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.anchor
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("anchor: {err}")))?;
        self.restore.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl Default for MarkyConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            anchor: AnchorConfig::default(),
            restore: RestoreYamlConfig::default(),
            storage: StorageYamlConfig::default(),
        }
    }
}

/// Timing of the mutation-triggered restoration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreYamlConfig {
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// Inserted subtrees with less text than this never schedule a pass.
    #[serde(default = "default_min_mutation_text_len")]
    pub min_mutation_text_len: usize,
}

impl RestoreYamlConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.quiet_period_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "restore.quiet_period_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RestoreYamlConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            min_mutation_text_len: default_min_mutation_text_len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageYamlConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub path: Option<String>,
}

impl StorageYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "storage.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.path.is_none() {
            return Err(ConfigLoadError::Validation(
                "storage.path is required when backend is 'redb'".to_string(),
            ));
        }

        Ok(())
    }

    pub fn backend_config(&self) -> Result<BackendConfig, ConfigLoadError> {
        self.validate()?;
        match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => Ok(BackendConfig::redb(path.clone())),
            _ => Ok(BackendConfig::in_memory()),
        }
    }
}

impl Default for StorageYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

fn default_quiet_period_ms() -> u64 {
    500
}
fn default_min_mutation_text_len() -> usize {
    20
}
fn default_backend() -> String {
    "in_memory".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
anchor:
  context_window: 80
restore:
  quiet_period_ms: 250
"#;

        let config = MarkyConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.anchor.context_window, 80);
        assert_eq!(config.anchor.search_window, 100);
        assert_eq!(config.restore.quiet_period(), Duration::from_millis(250));
        assert_eq!(config.restore.min_mutation_text_len, 20);
        assert_eq!(config.storage.backend, "in_memory");
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
storage:
  backend: "redb"
  path: "/tmp/marky.redb"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = MarkyConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.storage.backend_config().unwrap(),
            BackendConfig::redb("/tmp/marky.redb")
        );
    }

    #[test]
    fn test_default_config() {
        let config = MarkyConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.storage.backend_config().unwrap(),
            BackendConfig::InMemory
        );
    }

    #[test]
    fn test_version_is_checked() {
        let result = MarkyConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_anchor_validation() {
        let yaml = r#"
version: "1.0"
anchor:
  strong_bonus: 5
  weak_bonus: 10
"#;

        let result = MarkyConfig::from_yaml(yaml);
        assert!(result.unwrap_err().to_string().contains("strong_bonus"));
    }

    #[test]
    fn test_storage_validation() {
        let missing_path = MarkyConfig::from_yaml("version: \"1.0\"\nstorage:\n  backend: redb\n");
        assert!(missing_path
            .unwrap_err()
            .to_string()
            .contains("storage.path is required"));

        let unknown = MarkyConfig::from_yaml("version: \"1.0\"\nstorage:\n  backend: rocksdb\n");
        assert!(matches!(unknown, Err(ConfigLoadError::Validation(_))));

        let zero = MarkyConfig::from_yaml("version: \"1.0\"\nrestore:\n  quiet_period_ms: 0\n");
        assert!(matches!(zero, Err(ConfigLoadError::Validation(_))));
    }
}
