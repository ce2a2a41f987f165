use crate::error::{Result, TodoWebError};

/// Development-only signing secret used when none is configured.
pub const DEFAULT_SECRET_KEY: &str = "dev";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub secret_key: String,
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: crate::runtime_paths::default_db_path(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(TodoWebError::Config(
                "database path must not be empty".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(TodoWebError::Config(
                "secret key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convention_defaults_are_valid_but_insecure() {
        let config = Config::convention_defaults();
        assert!(config.validate().is_ok());
        assert!(config.uses_insecure_secret());
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn validate_rejects_blank_values() {
        let mut config = Config::convention_defaults();
        config.db_path = "  ".to_string();
        assert!(matches!(config.validate(), Err(TodoWebError::Config(_))));

        let mut config = Config::convention_defaults();
        config.secret_key.clear();
        assert!(matches!(config.validate(), Err(TodoWebError::Config(_))));
    }

    #[test]
    fn custom_secret_is_not_flagged() {
        let config = Config {
            secret_key: "s3cr3t".to_string(),
            ..Config::convention_defaults()
        };
        assert!(!config.uses_insecure_secret());
    }
}
