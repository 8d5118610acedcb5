//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::generation::GenerationConfig;
use crate::tracker::TrackerPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Generation client configuration
    pub generation: GenerationConfig,
    /// Video job polling policy
    pub tracker: TrackerPolicy,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Base directory for persisted task state
    pub data_dir: PathBuf,
    /// Which durable backend to use
    pub backend: StoreBackend,
}

/// Durable backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// One JSON file per key under `<data_dir>/state`
    #[default]
    File,
    /// `<data_dir>/state.db`
    Sqlite,
    /// Process memory, lost on exit
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreBackend::File => "file",
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        };
        f.write_str(label)
    }
}

impl PersistenceConfig {
    /// Directory used by the file backend
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    /// Database file used by the sqlite backend
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("state.db")
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir: env::var_os("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_data_dir),
                backend: match env::var("STORE_BACKEND") {
                    Ok(value) => value.parse().unwrap_or_else(|e| {
                        tracing::warn!("{}, using file backend", e);
                        StoreBackend::File
                    }),
                    Err(_) => StoreBackend::File,
                },
            },
            generation: GenerationConfig::from_env(),
            tracker: TrackerPolicy::from_env(),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_data_dir() -> PathBuf {
    // Default to ~/.content-studio or current directory
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".content-studio"),
        None => PathBuf::from(".content-studio"),
    }
}
