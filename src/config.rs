//! Configuration management for Bookshelf server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which implementation backs the data and identity services
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted PostgREST + GoTrue endpoints
    Remote,
    /// Process-local tables, lost on exit
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub backend: Backend,
    /// Project URL of the hosted service (REST and auth live under it)
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Where the current session is persisted between restarts
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuardConfig {
    pub protected_paths: Vec<String>,
    pub login_path: String,
    /// Treat every path except the login page as protected
    pub protect_all: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables (with prefix BOOKSHELF_)
            .add_source(
                Environment::with_prefix("BOOKSHELF")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("data.url", env::var("SUPABASE_URL").ok())?
            .set_override_option("data.anon_key", env::var("SUPABASE_KEY").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_paths: vec![
                "/dashboard/favorites".to_string(),
                "/dashboard/library".to_string(),
                "/dashboard/settings".to_string(),
                "/dashboard/wishlist".to_string(),
            ],
            login_path: "/login".to_string(),
            protect_all: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            auth: AuthConfig::default(),
            guard: GuardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
