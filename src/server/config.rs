//! API server configuration.
//!
//! Priority: environment variables > config file > defaults.
//!
//! Environment variables:
//! - `PANTRY_CONFIG`: Path to config file (default: ~/.config/pantry-server/config.yaml)
//! - `PANTRY_PORT`: Port to listen on (default: 3001)
//! - `PANTRY_STORAGE`: `sqlite` or `memory` (default: sqlite)
//! - `PANTRY_DATABASE_PATH`: SQLite database (default: ~/.local/share/pantry-server/pantry.db)
//! - `PANTRY_MAX_BODY_BYTES`: Request body ceiling (default: 10 MB)
//! - `PANTRY_MAX_DOCUMENT_BYTES`: Per-document ceiling (default: 5 MiB)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::documents::DEFAULT_MAX_DOCUMENT_BYTES;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Which storage adapter backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    pub storage: StorageBackend,
    /// Path to the SQLite database
    pub database_path: PathBuf,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Largest accepted serialized document
    pub max_document_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage: StorageBackend::Sqlite,
            database_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pantry-server")
                .join("pantry.db"),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config_path`, falling back to `PANTRY_CONFIG`
    /// and then the default location. A missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("PANTRY_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Some(port) = env_override("PANTRY_PORT")? {
            config.port = port;
        }
        if let Some(storage) = env_override("PANTRY_STORAGE")? {
            config.storage = storage;
        }
        if let Ok(db_path) = std::env::var("PANTRY_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Some(bytes) = env_override("PANTRY_MAX_BODY_BYTES")? {
            config.max_body_bytes = bytes;
        }
        if let Some(bytes) = env_override("PANTRY_MAX_DOCUMENT_BYTES")? {
            config.max_document_bytes = bytes;
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/pantry-server/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry-server")
            .join("config.yaml")
    }
}

fn env_override<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv(key, value)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::InvalidEnv(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
        assert!(config.database_path.to_string_lossy().contains("pantry.db"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/pantry.sqlite").unwrap();
        writeln!(file, "max_document_bytes: 1024").unwrap();
        writeln!(file, "storage: memory").unwrap();

        let config = ServerConfig::load(Some(config_path)).unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/custom/path/pantry.sqlite")
        );
        assert_eq!(config.max_document_bytes, 1024);
        assert_eq!(config.storage, StorageBackend::Memory);
        // Unspecified keys keep their defaults
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "max_body_bytes: 2048").unwrap();

        std::env::set_var("PANTRY_MAX_BODY_BYTES", "4096");

        let config = ServerConfig::load(Some(config_path));

        std::env::remove_var("PANTRY_MAX_BODY_BYTES");

        assert_eq!(config.unwrap().max_body_bytes, 4096);
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("sqlite".parse::<StorageBackend>(), Ok(StorageBackend::Sqlite));
        assert_eq!("MEMORY".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_invalid_env_value() {
        std::env::set_var("PANTRY_TEST_BAD_PORT", "not-a-port");

        let result = env_override::<u16>("PANTRY_TEST_BAD_PORT");

        std::env::remove_var("PANTRY_TEST_BAD_PORT");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv("PANTRY_TEST_BAD_PORT", _))
        ));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = ServerConfig::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
