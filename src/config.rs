use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Whether the handle-based file API is available. When false every
    /// open/save goes through upload/download.
    #[serde(default = "default_file_handles")]
    pub file_handles: bool,

    #[serde(default = "default_autosave_interval_seconds")]
    pub autosave_interval_seconds: u64,

    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,

    #[serde(default = "default_store_path")]
    pub store_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_file_handles() -> bool {
    true
}

fn default_autosave_interval_seconds() -> u64 {
    30
}

fn default_downloads_dir() -> String {
    if let Some(downloads) = dirs::download_dir() {
        downloads.to_string_lossy().to_string()
    } else if let Some(home) = dirs::home_dir() {
        home.join("Downloads").to_string_lossy().to_string()
    } else {
        "./Downloads".to_string()
    }
}

fn default_store_path() -> String {
    data_dir().join("storage.json").to_string_lossy().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_handles: default_file_handles(),
            autosave_interval_seconds: default_autosave_interval_seconds(),
            downloads_dir: default_downloads_dir(),
            store_path: default_store_path(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if let Ok(contents) = fs::read_to_string(&config_path) {
            let mut config = Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Error parsing config file: {}", e);
                Self::default()
            });

            config.downloads_dir = expand_tilde(&config.downloads_dir);
            config.store_path = expand_tilde(&config.store_path);

            config
        } else {
            // Create default config file if it doesn't exist
            let default_config = Self::default();
            if let Err(e) = default_config.save() {
                eprintln!("Error creating default config file: {}", e);
            }
            default_config
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn store_path(&self) -> &Path {
        Path::new(&self.store_path)
    }

    pub fn downloads_dir(&self) -> &Path {
        Path::new(&self.downloads_dir)
    }

    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("kanso");
        path.push("config.toml");
        path
    }
}

/// Directory holding the store file and the log.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("kanso");
    path
}

fn expand_tilde(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
