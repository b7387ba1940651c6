// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub data_root: PathBuf,
    pub max_body_bytes: usize,
    pub log_json: bool,
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_root: PathBuf::from("."),
            max_body_bytes: 25 * 1024 * 1024,
            log_json: true,
            shutdown_drain: Duration::from_millis(2000),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from a variable lookup; unparseable values keep defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("KEEPSAKE_BIND").unwrap_or(defaults.bind_addr),
            data_root: lookup("KEEPSAKE_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            max_body_bytes: lookup("KEEPSAKE_MAX_BODY_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.max_body_bytes),
            log_json: lookup("KEEPSAKE_LOG_JSON")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.log_json),
            shutdown_drain: lookup("KEEPSAKE_SHUTDOWN_DRAIN_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(defaults.shutdown_drain, Duration::from_millis),
        }
    }
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), String> {
    if cfg.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if cfg.data_root.as_os_str().is_empty() {
        return Err("data_root must not be empty".to_string());
    }
    if cfg.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(format!("invalid bind addr {}", cfg.bind_addr));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_lookup_overrides_defaults_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("KEEPSAKE_BIND", "127.0.0.1:9000"),
            ("KEEPSAKE_DATA_ROOT", "/srv/gallery"),
            ("KEEPSAKE_MAX_BODY_BYTES", "not-a-number"),
            ("KEEPSAKE_LOG_JSON", "no"),
        ]
        .into_iter()
        .collect();
        let cfg = ServerConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.data_root, PathBuf::from("/srv/gallery"));
        assert_eq!(cfg.max_body_bytes, ServerConfig::default().max_body_bytes);
        assert!(!cfg.log_json);
    }

    #[test]
    fn startup_config_validation_rejects_zero_body_limit() {
        let cfg = ServerConfig {
            max_body_bytes: 0,
            ..ServerConfig::default()
        };
        let err = validate_startup_config_contract(&cfg).expect_err("zero limit");
        assert!(err.contains("max_body_bytes"));
    }

    #[test]
    fn startup_config_validation_rejects_empty_root_and_bad_bind() {
        let cfg = ServerConfig {
            data_root: PathBuf::new(),
            ..ServerConfig::default()
        };
        assert!(validate_startup_config_contract(&cfg).is_err());
        let cfg = ServerConfig {
            bind_addr: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert!(validate_startup_config_contract(&cfg).is_err());
        assert!(validate_startup_config_contract(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn config_dump_lists_every_setting() {
        let dump = serde_json::to_value(ServerConfig::default()).expect("dump");
        for key in ["bind_addr", "data_root", "max_body_bytes", "log_json", "shutdown_drain"] {
            assert!(dump.get(key).is_some(), "missing {key}");
        }
        assert_eq!(dump["bind_addr"], "0.0.0.0:8080");
        assert_eq!(CONFIG_SCHEMA_VERSION, "1");
    }
}
