//! Server configuration.

mod loader;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::hub::handle::DEFAULT_INTAKE_CAPACITY;
use crate::websocket::connection::DEFAULT_OUTBOUND_CAPACITY;

pub use loader::{apply_env_overrides, apply_overrides, deep_merge, load_config};

/// Configuration for the wsevents server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8080`, `0` for auto-assign).
    pub port: u16,
    /// Upgrades are refused once the hub holds this many connections.
    pub max_connections: usize,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Outbound buffer slots per connection before it counts as stalled.
    pub outbound_capacity: usize,
    /// Hub intake slots shared by register, unregister and broadcast requests.
    pub intake_capacity: usize,
    /// Directory served for non-API paths, if any.
    pub static_dir: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            max_connections: 1024,
            max_message_size: 64 * 1024, // 64 KB
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            static_dir: None,
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_connections", self.max_connections),
            ("max_message_size", self.max_message_size),
            ("outbound_capacity", self.outbound_capacity),
            ("intake_capacity", self.intake_capacity),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{name} must be at least 1")));
            }
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("host must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.outbound_capacity, 256);
        assert_eq!(cfg.intake_capacity, 1024);
        assert!(cfg.static_dir.is_none());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let cfg = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn zero_capacity_rejected() {
        let cfg = ServerConfig {
            outbound_capacity: 0,
            ..ServerConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("outbound_capacity"));
    }

    #[test]
    fn empty_host_rejected() {
        let cfg = ServerConfig {
            host: " ".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ServerConfig = serde_json::from_str(r#"{"port":3000}"#).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.outbound_capacity, 256);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            static_dir: Some(PathBuf::from("public")),
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
