//! API configuration.

use std::time::Duration;

/// Which job store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Rest,
}

/// Where rendered assets are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishBackend {
    Local,
    R2,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    pub store_backend: StoreBackend,
    pub publish_backend: PublishBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB of script is plenty
            environment: "development".to_string(),
            store_backend: StoreBackend::Memory,
            publish_backend: PublishBackend::Local,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            store_backend: match std::env::var("JOB_STORE_BACKEND").as_deref() {
                Ok("rest") => StoreBackend::Rest,
                _ => StoreBackend::Memory,
            },
            publish_backend: match std::env::var("PUBLISH_BACKEND").as_deref() {
                Ok("r2") => PublishBackend::R2,
                _ => PublishBackend::Local,
            },
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_backend_selection() {
        std::env::set_var("JOB_STORE_BACKEND", "rest");
        std::env::set_var("PUBLISH_BACKEND", "r2");
        let config = ApiConfig::from_env();
        assert_eq!(config.store_backend, StoreBackend::Rest);
        assert_eq!(config.publish_backend, PublishBackend::R2);

        std::env::remove_var("JOB_STORE_BACKEND");
        std::env::remove_var("PUBLISH_BACKEND");
        let config = ApiConfig::from_env();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.publish_backend, PublishBackend::Local);
    }

    #[test]
    #[serial]
    fn test_cors_origins_split() {
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        let config = ApiConfig::from_env();
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        std::env::remove_var("CORS_ORIGINS");
    }
}
