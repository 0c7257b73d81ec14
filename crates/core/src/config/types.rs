use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use crate::fetcher::FetcherConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub mode: Mode,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Runtime mode. `Debug` turns on verbose logging by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Debug,
    Production,
}

impl Mode {
    /// Default tracing filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Mode::Debug => "debug,hyper=info,reqwest=info",
            Mode::Development | Mode::Production => "info,tower_http=debug",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Development => "development",
            Mode::Debug => "debug",
            Mode::Production => "production",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.orchestrator.max_tasks, 3);
        assert_eq!(config.orchestrator.max_files, 3);
        assert_eq!(config.fetcher.max_file_size_mb, 300);
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
mode = "production"

[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn test_unknown_mode_fails() {
        let result: Result<Config, _> = toml::from_str(r#"mode = "staging""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_log_filter() {
        assert!(Mode::Debug.default_log_filter().starts_with("debug"));
        assert!(Mode::Production.default_log_filter().starts_with("info"));
        assert_eq!(Mode::Debug.to_string(), "debug");
    }

    #[test]
    fn test_config_serializes_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"mode\":\"development\""));
        assert!(json.contains("\"max_tasks\":3"));
    }
}
