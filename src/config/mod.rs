use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable that points the client at a REST server.
pub const API_ENV: &str = "RMOLDTRACKER_API";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// When set, clients talk to this REST server instead of the local DB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_target_minutes")]
    pub target_minutes: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for client-local slots (schedule, current mold info).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_target_minutes() -> u64 {
    45
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            bind_addr: default_bind_addr(),
            api_url: None,
            poll_interval_secs: default_poll_interval(),
            target_minutes: default_target_minutes(),
            log_level: default_log_level(),
            storage_dir: None,
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rmoldtracker")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rmoldtracker")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rmoldtracker.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rmoldtracker.sqlite")
    }

    /// Where the schedule and current-mold slots live.
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => crate::utils::path::expand_tilde(dir),
            None => Self::config_dir().join("storage"),
        }
    }

    /// Target duration of a mold change, in seconds.
    pub fn target_secs(&self) -> u64 {
        self.target_minutes * 60
    }

    /// Load configuration from file, or return defaults if not found.
    /// `RMOLDTRACKER_API` overrides `api_url`.
    pub fn load() -> AppResult<Self> {
        let mut cfg = Self::load_from(&Self::config_file())?;
        if let Ok(url) = env::var(API_ENV)
            && !url.trim().is_empty()
        {
            cfg.api_url = Some(url.trim().to_string());
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(path).map_err(|_| AppError::ConfigSave)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration directory and file.
    ///
    /// In test mode the config file is left alone and only the returned
    /// config (with the custom database) is used.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        if !is_test {
            config.save_to(&Self::config_file())?;
        }

        Ok(config)
    }
}
