use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the pantry API
    pub server_url: String,
    /// Where the signed-in token is remembered between runs
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            session_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pantry")
                .join("session.yaml"),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        if let Ok(url) = std::env::var("PANTRY_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(path) = std::env::var("PANTRY_SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/pantry/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pantry")
            .join("config.yaml")
    }
}

/// Token remembered between CLI runs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SavedSession {
    pub token: Option<String>,
}

impl SavedSession {
    /// A missing file means no saved session.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e))?;
        }
        let contents = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;
        std::fs::write(path, contents).map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    WriteError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
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
        let config = Config::default();
        assert_eq!(config.server_url, "http://localhost:3001");
        assert!(config
            .session_path
            .to_string_lossy()
            .contains("session.yaml"));
    }

    #[test]
    fn test_load_no_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.session_path.ends_with("session.yaml"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "session_path: /custom/session.yaml").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.session_path, PathBuf::from("/custom/session.yaml"));
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: http://fromfile:1").unwrap();

        std::env::set_var("PANTRY_SERVER_URL", "http://fromenv:2");

        let config = Config::load(Some(config_path));

        std::env::remove_var("PANTRY_SERVER_URL");

        assert_eq!(config.unwrap().server_url, "http://fromenv:2");
    }

    #[test]
    fn test_saved_session_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("session.yaml");

        assert_eq!(SavedSession::load(&path).unwrap(), SavedSession::default());

        let session = SavedSession {
            token: Some("KITCH-AB23CD".to_string()),
        };
        session.save(&path).unwrap();

        assert_eq!(SavedSession::load(&path).unwrap(), session);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
