//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Transfer-core configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Whether the external authorization check is enabled
    pub authorization_enabled: bool,

    /// Fallback when the authorizer is unreachable: fail-open if true,
    /// fail-closed otherwise
    pub authorization_fail_open: bool,

    /// Commit attempts per transfer before surfacing a conflict
    pub max_commit_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let authorization_enabled = parse_bool("AUTHORIZATION_ENABLED", false)?;
        let authorization_fail_open = parse_bool("AUTHORIZATION_FAIL_OPEN", false)?;

        let max_commit_attempts: u32 = env::var("MAX_COMMIT_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("MAX_COMMIT_ATTEMPTS"))?;

        if max_commit_attempts == 0 {
            return Err(ConfigError::InvalidValue("MAX_COMMIT_ATTEMPTS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            authorization_enabled,
            authorization_fail_open,
            max_commit_attempts,
        })
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue(name)),
        },
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // from_env reads process-global state; these tests take turns
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_optional_vars() {
        for name in [
            "DATABASE_MAX_CONNECTIONS",
            "AUTHORIZATION_ENABLED",
            "AUTHORIZATION_FAIL_OPEN",
            "MAX_COMMIT_ATTEMPTS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn missing_database_url_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_optional_vars();
        env::remove_var("DATABASE_URL");

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::MissingEnv("DATABASE_URL"))));
    }

    #[test]
    fn defaults_apply_when_only_the_url_is_set() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_optional_vars();
        env::set_var("DATABASE_URL", "postgres://localhost/payflow");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/payflow");
        assert_eq!(config.database_max_connections, 10);
        assert!(!config.authorization_enabled);
        assert!(!config.authorization_fail_open);
        assert_eq!(config.max_commit_attempts, 3);
    }

    #[test]
    fn zero_commit_attempts_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_optional_vars();
        env::set_var("DATABASE_URL", "postgres://localhost/payflow");
        env::set_var("MAX_COMMIT_ATTEMPTS", "0");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("MAX_COMMIT_ATTEMPTS"))
        ));
        env::remove_var("MAX_COMMIT_ATTEMPTS");
    }

    #[test]
    fn booleans_accept_flag_spellings_case_insensitively() {
        const NAME: &str = "PAYFLOW_BOOL_FLAG";

        for (value, expected) in [("true", true), ("1", true), ("False", false), ("0", false)] {
            env::set_var(NAME, value);
            assert_eq!(parse_bool(NAME, true).unwrap(), expected);
        }

        env::set_var(NAME, "maybe");
        assert!(matches!(
            parse_bool(NAME, false),
            Err(ConfigError::InvalidValue(NAME))
        ));

        env::remove_var(NAME);
        assert!(parse_bool(NAME, true).unwrap());
        assert!(!parse_bool(NAME, false).unwrap());
    }
}
