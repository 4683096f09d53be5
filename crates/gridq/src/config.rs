// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client configuration.
//!
//! All process-wide state the client reads: the locally configured
//! collector set, the local schedd (if any), and transport limits.
//! Load once at startup, treat as immutable, and pass explicitly into
//! client constructors; there is no ambient global configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Location of the locally configured schedd.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalScheddConfig {
    /// Daemon address (`host:port`). Required to actually query it.
    #[serde(default)]
    pub address: Option<String>,

    /// Daemon display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Host the daemon runs on.
    #[serde(default)]
    pub hostname: Option<String>,

    /// Daemon protocol version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The locally configured collector set, queried in order when no
    /// pool is named.
    #[serde(default)]
    pub collectors: Vec<String>,

    /// Local schedd location, if one is configured on this host.
    #[serde(default)]
    pub local_schedd: Option<LocalScheddConfig>,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-query read timeout in seconds. A timed-out query classifies
    /// as unreachable.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Maximum accepted response frame size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    30
}

fn default_max_message_size() -> usize {
    16 * 1024 * 1024 // 16 MB
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collectors: Vec::new(),
            local_schedd: None,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with a single collector.
    pub fn new(collector: impl Into<String>) -> Self {
        Self {
            collectors: vec![collector.into()],
            ..Default::default()
        }
    }

    /// Builder: append a collector to the default pool set.
    pub fn with_collector(mut self, address: impl Into<String>) -> Self {
        self.collectors.push(address.into());
        self
    }

    /// Builder: set the local schedd location.
    pub fn with_local_schedd(mut self, schedd: LocalScheddConfig) -> Self {
        self.local_schedd = Some(schedd);
        self
    }

    /// Builder: set the connect timeout.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Builder: set the read timeout.
    pub fn with_read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    /// Builder: set the maximum response frame size.
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(Error::ConfigurationError(
                "connect_timeout_secs must be > 0".into(),
            ));
        }
        if self.read_timeout_secs == 0 {
            return Err(Error::ConfigurationError(
                "read_timeout_secs must be > 0".into(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(Error::ConfigurationError(
                "max_message_size must be > 0".into(),
            ));
        }
        if self.collectors.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::ConfigurationError(
                "collector addresses must be non-empty".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigurationError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ClientConfig = serde_json::from_str(&content).map_err(|e| {
            Error::ConfigurationError(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigurationError(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigurationError(format!("cannot write {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.collectors.is_empty());
        assert!(config.local_schedd.is_none());
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::new("pool-a.example.org:9618")
            .with_collector("pool-b.example.org:9618")
            .with_connect_timeout_secs(2)
            .with_read_timeout_secs(10)
            .with_max_message_size(1024);

        assert_eq!(
            config.collectors,
            ["pool-a.example.org:9618", "pool-b.example.org:9618"]
        );
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.read_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_message_size, 1024);
    }

    #[test]
    fn test_validation_errors() {
        let config = ClientConfig {
            connect_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            max_message_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_collector("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");

        let config = ClientConfig::new("collector.example.org:9618").with_local_schedd(
            LocalScheddConfig {
                address: Some("127.0.0.1:9615".into()),
                name: Some("sched1@node7".into()),
                hostname: Some("node7".into()),
                version: Some("0.3".into()),
            },
        );
        config.to_file(&path).unwrap();

        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded.collectors, ["collector.example.org:9618"]);
        let schedd = loaded.local_schedd.unwrap();
        assert_eq!(schedd.address.as_deref(), Some("127.0.0.1:9615"));
        assert_eq!(schedd.name.as_deref(), Some("sched1@node7"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"collectors":["c1:9618"]}"#).unwrap();

        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded.collectors, ["c1:9618"]);
        assert_eq!(loaded.read_timeout(), Duration::from_secs(30));
        assert_eq!(loaded.max_message_size, 16 * 1024 * 1024);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = ClientConfig::from_file(Path::new("/no/such/config.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }
}
