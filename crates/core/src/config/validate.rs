use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Task and file limits are at least 1
/// - The mailbox can hold at least one command
/// - The fetcher has a non-empty allowlist and a positive size ceiling
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Orchestrator validation
    let orchestrator = &config.orchestrator;
    if orchestrator.max_tasks == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_tasks must be at least 1".to_string(),
        ));
    }
    if orchestrator.max_files == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_files must be at least 1".to_string(),
        ));
    }
    if orchestrator.mailbox_size == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.mailbox_size must be at least 1".to_string(),
        ));
    }
    if orchestrator.request_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.request_timeout_ms cannot be 0".to_string(),
        ));
    }

    // Fetcher validation
    let fetcher = &config.fetcher;
    if fetcher.max_file_size_mb == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_file_size_mb cannot be 0".to_string(),
        ));
    }
    if fetcher
        .allowed_extensions
        .iter()
        .all(|ext| ext.trim_start_matches('.').is_empty())
    {
        return Err(ConfigError::ValidationError(
            "fetcher.allowed_extensions must list at least one extension".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_limits_fail() {
        let mut config = Config::default();
        config.orchestrator.max_tasks = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.orchestrator.max_files = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.orchestrator.mailbox_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_allowlist_fails() {
        let mut config = Config::default();
        config.fetcher.allowed_extensions = vec![".".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("allowed_extensions"));
    }

    #[test]
    fn test_validate_zero_file_size_fails() {
        let mut config = Config::default();
        config.fetcher.max_file_size_mb = 0;
        assert!(validate_config(&config).is_err());
    }
}
