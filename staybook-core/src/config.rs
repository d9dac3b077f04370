use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HotelError, Result};
use crate::validation::DEFAULT_MIN_PASSWORD_LENGTH;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "STAYBOOK_CONFIG";

/// Environment variable overriding the data root
pub const DATA_DIR_ENV: &str = "STAYBOOK_DATA_DIR";

/// User configuration, stored as YAML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding `accounts.db` and `branch_database/`
    pub data_dir: PathBuf,
    pub min_password_length: usize,
    /// chrono format string used when showing reservation dates
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            date_format: "%b %d, %Y".to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            HotelError::Config(format!(
                "Failed to parse config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })
    }

    /// Loads the config, writing a default file first if none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "created default config");
            return Ok(config);
        }
        Self::load(path)
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)
            .map_err(|e| HotelError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)?;
        Ok(())
    }

    /// Picks the data root: explicit flag, then `STAYBOOK_DATA_DIR`, then the config value
    pub fn resolve_data_dir(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(dir) = flag {
            return dir.to_path_buf();
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }
        self.data_dir.clone()
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir()
        .ok_or_else(|| HotelError::Config("Failed to determine home directory".to_string()))?;

    Ok(home_dir.join(".staybook.config"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("staybook")
}
