use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Group whose room membership the hub reports by default
    #[serde(default = "default_session_group")]
    pub session_group: String,

    /// Base URL of the slide lookup service
    #[serde(default = "default_slide_service_url")]
    pub slide_service_url: String,

    /// Per-request timeout for slide lookups, in seconds
    pub lookup_timeout_secs: Option<u64>,

    /// Number of resolved thumbnail URLs kept per deck
    #[serde(default = "default_thumbnail_cache_capacity")]
    pub thumbnail_cache_capacity: u64,

    /// Group table published when the session document is created, comma separated
    pub initial_group_table: Option<String>,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_secs.map(Duration::from_secs)
    }

    /// Allowed CORS origins; empty when unset.
    pub fn cors_origin_list(&self) -> Vec<String> {
        split_list(self.cors_origins.as_deref())
    }

    pub fn initial_group_table(&self) -> Vec<String> {
        split_list(self.initial_group_table.as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            session_group: default_session_group(),
            slide_service_url: default_slide_service_url(),
            lookup_timeout_secs: None,
            thumbnail_cache_capacity: default_thumbnail_cache_capacity(),
            initial_group_table: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_session_group() -> String {
    "default".to_string()
}

fn default_slide_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_thumbnail_cache_capacity() -> u64 {
    512
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_trimmed_and_skip_blanks() {
        let config = Config {
            initial_group_table: Some("A1, B2,,C3 ".into()),
            cors_origins: Some("http://localhost:4200".into()),
            ..Config::default()
        };
        assert_eq!(config.initial_group_table(), vec!["A1", "B2", "C3"]);
        assert_eq!(config.cors_origin_list(), vec!["http://localhost:4200"]);
        assert!(Config::default().initial_group_table().is_empty());
    }

    #[test]
    fn timeout_is_optional() {
        assert_eq!(Config::default().lookup_timeout(), None);
        let config = Config {
            lookup_timeout_secs: Some(5),
            ..Config::default()
        };
        assert_eq!(config.lookup_timeout(), Some(Duration::from_secs(5)));
    }
}
