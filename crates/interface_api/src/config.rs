//! API configuration

use serde::Deserialize;

/// Where the ports keep their data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// In-memory ports; data is lost on restart
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// API configuration
///
/// Every field can be set through an `API_`-prefixed environment variable,
/// e.g. `API_PORT=9000` or `API_STORAGE=memory`. Unset fields keep their
/// defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub db_acquire_timeout_secs: u64,
    pub storage: StorageBackend,
    /// Optional JSON benefit schedule; the built-in schedule is used otherwise
    pub benefits_file: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Credentials accepted by `POST /api/v1/auth/token`
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/hmo".to_string(),
            db_max_connections: 10,
            db_acquire_timeout_secs: 10,
            storage: StorageBackend::Postgres,
            benefits_file: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .set_override("storage", "memory")
            .unwrap()
            .set_override("log_format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.jwt_expiration_secs, 3600);
    }
}
