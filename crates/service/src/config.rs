//! Service configuration.

use serde::{Deserialize, Serialize};

use formbridge_events::UnmatchedPolicy;

/// Service-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bus the default in-memory transport is named after.
    pub bus_name: String,
    /// Event source for form operations.
    pub forms_source: String,
    /// Event source for data operations.
    pub data_source: String,
    /// Per-call delivery deadline in milliseconds. Zero disables it.
    pub delivery_timeout_ms: u64,
    /// What to do when a published event matches no rule.
    pub unmatched_policy: UnmatchedPolicy,
    /// Log level.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bus_name: "backoffice-event-bus".to_string(),
            forms_source: "backoffice.forms".to_string(),
            data_source: "backoffice.data".to_string(),
            delivery_timeout_ms: 0,
            unmatched_policy: UnmatchedPolicy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Returns the delivery deadline, or `None` when disabled.
    pub fn delivery_timeout(&self) -> Option<std::time::Duration> {
        if self.delivery_timeout_ms == 0 {
            None
        } else {
            Some(std::time::Duration::from_millis(self.delivery_timeout_ms))
        }
    }
}

/// Loads configuration from a TOML file.
///
/// The file holds an optional `[service]` table; missing keys fall back
/// to their defaults.
pub fn load_config(path: &str) -> Result<ServiceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: toml::Value =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let service: ServiceConfig = config
        .get("service")
        .map(|v| toml::Value::try_into(v.clone()))
        .transpose()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?
        .unwrap_or_default();

    Ok(service)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.bus_name, "backoffice-event-bus");
        assert_eq!(config.forms_source, "backoffice.forms");
        assert_eq!(config.data_source, "backoffice.data");
        assert!(config.delivery_timeout().is_none());
    }

    #[test]
    fn test_timeout_enabled_when_nonzero() {
        let config = ServiceConfig {
            delivery_timeout_ms: 250,
            ..ServiceConfig::default()
        };
        assert_eq!(
            config.delivery_timeout(),
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn test_load_config_roundtrip() {
        let dir = std::env::temp_dir().join("formbridge-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("service.toml");
        std::fs::write(
            &path,
            r#"
[service]
bus_name = "staging-bus"
forms_source = "backoffice.forms"
data_source = "backoffice.data"
delivery_timeout_ms = 500
unmatched_policy = "ignore"
log_level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bus_name, "staging-bus");
        assert_eq!(config.delivery_timeout_ms, 500);
        assert_eq!(config.unmatched_policy, UnmatchedPolicy::Ignore);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_table_keeps_defaults_for_missing_keys() {
        let dir = std::env::temp_dir().join("formbridge-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        std::fs::write(
            &path,
            r#"
[service]
bus_name = "staging-bus"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bus_name, "staging-bus");
        assert_eq!(config.forms_source, "backoffice.forms");
        assert_eq!(config.log_level, "info");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let error = load_config("/nonexistent/formbridge.toml").unwrap_err();
        assert!(matches!(error, ConfigError::IoError(_)));
    }

    #[test]
    fn test_empty_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("formbridge-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bus_name, "backoffice-event-bus");

        std::fs::remove_file(&path).ok();
    }
}
