use crate::error::ScanError;
use crate::models::config::AppConfig;
use std::fs;
use std::path::PathBuf;

/// Configuration manager for scanner settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager rooted in the platform config directory
    ///
    /// This will create the config directory if it doesn't exist.
    pub fn new() -> Result<Self, ScanError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScanError::Config("Failed to determine config directory".to_string()))?
            .join("symcode-scanner");

        fs::create_dir_all(&config_dir)
            .map_err(|e| ScanError::Config(format!("Failed to create config directory: {}", e)))?;

        let config_path = config_dir.join("config.json");

        Ok(Self {
            config_dir,
            config_path,
        })
    }

    /// Use an explicit config file; its parent directory is created on save
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let config_dir = config_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk
    pub fn save(&self, config: &AppConfig) -> Result<(), ScanError> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| ScanError::Config(format!("Failed to create config directory: {}", e)))?;

        // Pretty print for human readability
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ScanError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.config_path, json)
            .map_err(|e| ScanError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<AppConfig, ScanError> {
        if !self.config_exists() {
            tracing::info!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ScanError::Config(format!("Failed to read config file: {}", e)))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| ScanError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
