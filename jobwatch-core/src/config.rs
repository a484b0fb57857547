use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

const APP_DIR: &str = "jobwatch";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollConfig {
    /// Number of jobs requested per cycle.
    pub page_size: u32,
    /// Upper bound on cached jobs.
    pub cache_limit: usize,
    /// Period of the settings heartbeat.
    pub settings_check_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub app_name: String,
    pub icon: Option<String>,
    /// Opened when a notification is clicked.
    pub popup_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.upwork.com".to_string(),
            user_agent: concat!("jobwatch/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            cache_limit: 100,
            settings_check_minutes: 1,
        }
    }
}

impl PollConfig {
    pub fn settings_check_period(&self) -> Duration {
        minutes(self.settings_check_minutes.max(1))
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            app_name: "jobwatch".to_string(),
            icon: None,
            popup_url: "https://www.upwork.com/nx/find-work/".to_string(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            auth_url: "https://www.upwork.com/ab/account-security/oauth2/authorize".to_string(),
            token_url: "https://www.upwork.com/api/v3/oauth2/token".to_string(),
            redirect_url: "http://localhost/complete".to_string(),
            scopes: Vec::new(),
        }
    }
}

impl OAuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("client_id", &self.client_id),
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("redirect_url", &self.redirect_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::required(field));
            }
        }
        Ok(())
    }
}

pub fn minutes(count: u32) -> Duration {
    Duration::from_secs(u64::from(count) * 60)
}

impl AppConfig {
    /// `<config dir>/jobwatch`, created on demand.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?.join(APP_DIR);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn settings_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    pub fn store_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("store.json"))
    }

    /// Loads the configuration file, writing the defaults back if it is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "could not load configuration, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    warn!(error = %save_err, "could not save default configuration");
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(Self::config_file_path()?)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::config_file_path()?, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"poll":{"page_size":10,"cache_limit":5,"settings_check_minutes":2}}"#)
                .unwrap();
        assert_eq!(config.poll.cache_limit, 5);
        assert_eq!(config.poll.settings_check_period(), Duration::from_secs(120));
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.oauth.redirect_url, "http://localhost/complete");
    }

    #[test]
    fn missing_client_id_is_reported_by_name() {
        let err = OAuthConfig::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "client_id parameter is required");
    }
}
