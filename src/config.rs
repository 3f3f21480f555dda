//! Configuration for the SetuRelay daemon
//!
//! Loads configuration from a TOML file with one `[[listener]]` block per
//! TCP listener. Built-in defaults match the classic deployment: a command
//! listener on 0.0.0.0:4242 and a plain relay on 0.0.0.0:5000.
//!
//! Environment overrides:
//! - `SETU_HOST` replaces the host part of every listener's bind address
//! - `SETU_<NAME>_PORT` replaces one listener's port (name uppercased)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How a listener treats inbound bytes from connected robots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerMode {
    /// Inbound bytes are heartbeats/no-ops; outbound traffic is operator
    /// command frames
    Command,
    /// Inbound bytes from one robot are rebroadcast to all other robots
    Relay,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// TCP listeners to run
    #[serde(rename = "listener")]
    pub listeners: Vec<ListenerConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One TCP listener
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Listener name, used in log lines and the `SETU_<NAME>_PORT` override
    pub name: String,
    /// Bind address, e.g. `0.0.0.0:4242`
    pub bind: String,
    /// Inbound byte handling
    pub mode: ListenerMode,
    /// Fixed i32 heartbeat reply (command mode); omit to drain silently
    #[serde(default)]
    pub heartbeat_reply: Option<i32>,
    /// Seconds with no inbound traffic before a connection is closed
    /// (0 disables idle reclamation)
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl ListenerConfig {
    /// Idle reclamation window, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_secs))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults: command listener on 4242, plain relay on 5000
    pub fn defaults() -> Self {
        Self {
            listeners: vec![
                ListenerConfig {
                    name: "calibration".to_string(),
                    bind: "0.0.0.0:4242".to_string(),
                    mode: ListenerMode::Command,
                    heartbeat_reply: Some(40),
                    idle_timeout_secs: default_idle_timeout_secs(),
                },
                ListenerConfig {
                    name: "relay".to_string(),
                    bind: "0.0.0.0:5000".to_string(),
                    mode: ListenerMode::Relay,
                    heartbeat_reply: None,
                    idle_timeout_secs: default_idle_timeout_secs(),
                },
            ],
            logging: LoggingConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.listeners.is_empty() {
            return Err(Error::Config("no listeners configured".to_string()));
        }
        for (i, listener) in self.listeners.iter().enumerate() {
            if self.listeners[..i].iter().any(|l| l.name == listener.name) {
                return Err(Error::Config(format!(
                    "duplicate listener name: {}",
                    listener.name
                )));
            }
        }
        Ok(())
    }

    /// Apply `SETU_HOST` and `SETU_<NAME>_PORT` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let host_override = env::var("SETU_HOST").ok();

        for listener in &mut self.listeners {
            let (mut host, mut port) = split_bind(&listener.bind)?;

            if let Some(ref h) = host_override {
                host = h.clone();
            }

            let port_var = format!("SETU_{}_PORT", listener.name.to_uppercase());
            if let Ok(value) = env::var(&port_var) {
                port = value.parse().map_err(|_| {
                    Error::Config(format!("{}: invalid port: {}", port_var, value))
                })?;
            }

            listener.bind = format!("{}:{}", host, port);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

fn split_bind(bind: &str) -> Result<(String, u16)> {
    let (host, port) = bind
        .rsplit_once(':')
        .ok_or_else(|| Error::Config(format!("invalid bind address: {}", bind)))?;
    let port = port
        .parse()
        .map_err(|_| Error::Config(format!("invalid bind address: {}", bind)))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::defaults();
        assert_eq!(config.listeners.len(), 2);
        assert_eq!(config.listeners[0].name, "calibration");
        assert_eq!(config.listeners[0].bind, "0.0.0.0:4242");
        assert_eq!(config.listeners[0].mode, ListenerMode::Command);
        assert_eq!(config.listeners[0].heartbeat_reply, Some(40));
        assert_eq!(config.listeners[1].bind, "0.0.0.0:5000");
        assert_eq!(config.listeners[1].mode, ListenerMode::Relay);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[[listener]]
name = "sac"
bind = "127.0.0.1:5050"
mode = "command"
heartbeat_reply = 40

[[listener]]
name = "relay"
bind = "127.0.0.1:5000"
mode = "relay"
idle_timeout_secs = 0

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.listeners[0].name, "sac");
        assert_eq!(config.listeners[0].bind, "127.0.0.1:5050");
        assert_eq!(config.listeners[0].idle_timeout_secs, 300);
        assert_eq!(config.listeners[1].idle_timeout(), None);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[[listener]]\nname = \"cmd\"\nbind = \"0.0.0.0:4242\"\nmode = \"command\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.listeners.len(), 1);
        assert_eq!(config.listeners[0].name, "cmd");
        assert_eq!(config.listeners[0].heartbeat_reply, None);
    }

    #[test]
    fn test_empty_listener_list_rejected() {
        let err = Config {
            listeners: Vec::new(),
            logging: LoggingConfig::default(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_listener_names_rejected() {
        let mut config = Config::defaults();
        config.listeners[1].name = config.listeners[0].name.clone();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_port_override() {
        let mut config = Config::defaults();
        config.listeners[0].name = "envtest".to_string();
        env::set_var("SETU_ENVTEST_PORT", "7777");
        config.apply_env_overrides().unwrap();
        env::remove_var("SETU_ENVTEST_PORT");

        assert_eq!(config.listeners[0].bind, "0.0.0.0:7777");
        assert_eq!(config.listeners[1].bind, "0.0.0.0:5000");
    }

    #[test]
    fn test_env_port_override_invalid() {
        let mut config = Config::defaults();
        config.listeners[0].name = "badport".to_string();
        env::set_var("SETU_BADPORT_PORT", "not-a-port");
        let result = config.apply_env_overrides();
        env::remove_var("SETU_BADPORT_PORT");

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
