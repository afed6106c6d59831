use thiserror::Error;

use crate::view::FEATURE_KEY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse {var} as {expected_type}: {source}")]
    ParseError {
        var: String,
        expected_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Configuration for logging and the notification history
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub notice_size: usize,
    pub rust_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            notice_size: 100,
            rust_log: "info".to_string(),
        }
    }
}

/// Configuration for the activity view session
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub fetch_timeout_secs: u64,
    pub permissions: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            permissions: vec![FEATURE_KEY.to_string()],
        }
    }
}

/// Configuration for transport layer
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub transport: String,
    pub bind_address: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Main configuration container
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log: LogConfig,
    pub view: ViewConfig,
    pub transport: TransportConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // ACTIVITY_VIEW_TRANSPORT
        if let Ok(transport) = std::env::var("ACTIVITY_VIEW_TRANSPORT") {
            config.transport.transport = transport;
        }

        // ACTIVITY_VIEW_BIND
        if let Ok(bind_address) = std::env::var("ACTIVITY_VIEW_BIND") {
            config.transport.bind_address = bind_address;
        }

        // ACTIVITY_VIEW_FETCH_TIMEOUT
        if let Ok(timeout_str) = std::env::var("ACTIVITY_VIEW_FETCH_TIMEOUT") {
            config.view.fetch_timeout_secs =
                timeout_str.parse().map_err(|e| ConfigError::ParseError {
                    var: "ACTIVITY_VIEW_FETCH_TIMEOUT".to_string(),
                    expected_type: "u64".to_string(),
                    source: Box::new(e),
                })?;
        }

        // ACTIVITY_VIEW_NOTICE_SIZE
        if let Ok(size_str) = std::env::var("ACTIVITY_VIEW_NOTICE_SIZE") {
            config.log.notice_size = size_str.parse().map_err(|e| ConfigError::ParseError {
                var: "ACTIVITY_VIEW_NOTICE_SIZE".to_string(),
                expected_type: "usize".to_string(),
                source: Box::new(e),
            })?;
        }

        // ACTIVITY_VIEW_PERMISSIONS
        if let Ok(permissions) = std::env::var("ACTIVITY_VIEW_PERMISSIONS") {
            config.view.permissions = permissions
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        // RUST_LOG
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.log.rust_log = rust_log;
        }

        // Validation
        if config.view.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "ACTIVITY_VIEW_FETCH_TIMEOUT".to_string(),
                message: "timeout must be greater than 0".to_string(),
            });
        }

        if config.log.notice_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "ACTIVITY_VIEW_NOTICE_SIZE".to_string(),
                message: "notice size must be greater than 0".to_string(),
            });
        }

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.view.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 6] = [
        "ACTIVITY_VIEW_TRANSPORT",
        "ACTIVITY_VIEW_BIND",
        "ACTIVITY_VIEW_FETCH_TIMEOUT",
        "ACTIVITY_VIEW_NOTICE_SIZE",
        "ACTIVITY_VIEW_PERMISSIONS",
        "RUST_LOG",
    ];

    /// Run `f` with exactly `vars` set among the variables read by `from_env`
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let original: Vec<_> = ENV_VARS
            .iter()
            .map(|&var| (var, std::env::var(var).ok()))
            .collect();

        unsafe {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
            for (var, value) in vars {
                std::env::set_var(var, value);
            }
        }

        let result = f();

        unsafe {
            for (var, value) in original {
                match value {
                    Some(v) => std::env::set_var(var, v),
                    None => std::env::remove_var(var),
                }
            }
        }
        result
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport.transport, "stdio");
        assert_eq!(config.transport.bind_address, "127.0.0.1:8000");
        assert_eq!(config.view.fetch_timeout_secs, 30);
        assert_eq!(config.view.permissions, vec!["menu_user_activity"]);
        assert_eq!(config.log.notice_size, 100);
        assert_eq!(config.log.rust_log, "info");
    }

    #[test]
    #[serial]
    fn test_from_env_with_defaults() {
        let config = with_env(&[], Config::from_env).unwrap();
        assert_eq!(config.transport.transport, "stdio");
        assert_eq!(config.view.fetch_timeout_secs, 30);
        assert_eq!(config.log.notice_size, 100);
        assert_eq!(config.fetch_timeout(), std::time::Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        let config = with_env(
            &[
                ("ACTIVITY_VIEW_TRANSPORT", "http"),
                ("ACTIVITY_VIEW_BIND", "0.0.0.0:9000"),
                ("ACTIVITY_VIEW_FETCH_TIMEOUT", "5"),
                ("ACTIVITY_VIEW_NOTICE_SIZE", "10"),
                ("ACTIVITY_VIEW_PERMISSIONS", "menu_user_activity, menu_flows,,"),
            ],
            Config::from_env,
        )
        .unwrap();

        assert_eq!(config.transport.transport, "http");
        assert_eq!(config.transport.bind_address, "0.0.0.0:9000");
        assert_eq!(config.view.fetch_timeout_secs, 5);
        assert_eq!(config.log.notice_size, 10);
        assert_eq!(config.view.permissions, vec!["menu_user_activity", "menu_flows"]);
    }

    #[test]
    #[serial]
    fn test_invalid_timeout() {
        let result = with_env(&[("ACTIVITY_VIEW_FETCH_TIMEOUT", "soon")], Config::from_env);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_zero_timeout_validation() {
        let result = with_env(&[("ACTIVITY_VIEW_FETCH_TIMEOUT", "0")], Config::from_env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_zero_notice_size_validation() {
        let result = with_env(&[("ACTIVITY_VIEW_NOTICE_SIZE", "0")], Config::from_env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_empty_permissions_deny_everything() {
        let config = with_env(&[("ACTIVITY_VIEW_PERMISSIONS", "")], Config::from_env).unwrap();
        assert!(config.view.permissions.is_empty());
    }
}
