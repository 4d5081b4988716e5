//! Configuration schema.
//!
//! The on-disk format is TOML:
//!
//! ```toml
//! [core]
//! active_modules = ["heartbeat", "file_watch"]
//!
//! [core.http]
//! bind = "127.0.0.1"
//! port = 8462
//!
//! [core.notify]
//! sender = "vigil@example.com"
//! receivers = ["ops@example.com"]
//!
//! [engines.heartbeat]
//! interval_secs = 5
//!
//! [engines.file_watch]
//! interval_secs = 10
//! paths = ["/etc/hosts"]
//! ```
//!
//! Engine sections are kept as opaque JSON values: each module
//! deserializes its own section inside `initialize`, so new engines
//! need no schema changes here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Host-level settings.
    pub core: CoreConfig,

    /// Per-engine configuration sections, keyed by engine name.
    pub engines: HashMap<String, serde_json::Value>,
}

impl VigilConfig {
    /// Returns the configuration section for an engine
    /// (case-insensitive).
    #[must_use]
    pub fn engine(&self, name: &str) -> Option<&serde_json::Value> {
        self.engines
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Host-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Engine names to register at startup (case-insensitive
    /// allow-list against the builtin catalog).
    pub active_modules: Vec<String>,

    /// Command API listener settings.
    pub http: HttpConfig,

    /// Shared notification sender settings.
    pub notify: NotifyConfig,
}

/// Command API listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address.
    pub bind: String,

    /// Listener port.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8462,
        }
    }
}

/// Shared notification sender settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Sender address; empty means notification is unconfigured.
    pub sender: String,

    /// Receiver addresses.
    pub receivers: Vec<String>,
}

impl NotifyConfig {
    /// Returns `true` if a sender address is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.sender.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = VigilConfig::default();
        assert!(config.core.active_modules.is_empty());
        assert_eq!(config.core.http.port, 8462);
        assert_eq!(config.core.http.bind, "127.0.0.1");
        assert!(!config.core.notify.is_configured());
    }

    #[test]
    fn parse_toml() {
        let config: VigilConfig = toml::from_str(
            r#"
            [core]
            active_modules = ["heartbeat"]

            [core.notify]
            sender = "vigil@example.com"
            receivers = ["ops@example.com"]

            [engines.heartbeat]
            interval_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.core.active_modules, vec!["heartbeat"]);
        assert!(config.core.notify.is_configured());
        assert_eq!(
            config.engine("heartbeat"),
            Some(&json!({ "interval_secs": 3 }))
        );
    }

    #[test]
    fn engine_lookup_case_insensitive() {
        let mut config = VigilConfig::default();
        config.engines.insert("heartbeat".into(), json!({}));
        assert!(config.engine("HeartBeat").is_some());
        assert!(config.engine("missing").is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: VigilConfig = toml::from_str("").unwrap();
        assert_eq!(config, VigilConfig::default());
    }
}
