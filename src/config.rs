use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

pub const ENV_CLIENT_ID: &str = "KB_REVIEW_CLIENT_ID";
pub const ENV_SPREADSHEET_ID: &str = "KB_REVIEW_SPREADSHEET_ID";
pub const ENV_SHEET_NAME: &str = "KB_REVIEW_SHEET_NAME";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client_id: Option<String>,
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Shell command printing a bearer token on stdout
    pub token_command: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

fn default_sheet_name() -> String {
    "discourse_topics".to_string()
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_write_timeout() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            api_base: default_api_base(),
            token_command: None,
            request_timeout_secs: default_request_timeout(),
            write_timeout_secs: default_write_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads the file at `path`, writing defaults there first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment values win over the file; blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_blank(ENV_CLIENT_ID) {
            self.client_id = Some(id);
        }
        if let Some(id) = non_blank(ENV_SPREADSHEET_ID) {
            self.spreadsheet_id = Some(id);
        }
        if let Some(name) = non_blank(ENV_SHEET_NAME) {
            self.sheet_name = name;
        }
    }

    /// The client id is the one setting nothing can run without.
    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "client_id is not set. Add it to {} or export {ENV_CLIENT_ID}",
                    Self::config_path().display()
                ))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kb-review")
            .join("config.toml")
    }
}
