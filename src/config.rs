use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ConsoleError;
use crate::telemetry::DEFAULT_POLL_INTERVAL;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "dockwatch";
pub const API_BASE_URL_ENV: &str = "DOCKWATCH_API_BASE_URL";
const DEFAULT_REQUEST_TIMEOUT_S: u64 = 30;

/// Where a loaded [`AppConfig`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    /// No config file yet
    Defaults,
    /// A config file exists but could not be read or parsed
    Unreadable,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Backend base URL, overridden by the environment and the command line
    pub api_base_url: Option<String>,
    pub poll_interval_s: u64,
    pub request_timeout_s: u64,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            poll_interval_s: DEFAULT_POLL_INTERVAL.as_secs(),
            request_timeout_s: DEFAULT_REQUEST_TIMEOUT_S,
            window_width: 960.,
            window_height: 640.,
        }
    }
}

impl AppConfig {
    fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the user's config directory, falling back to
    /// defaults.
    pub fn load_local() -> (Self, ConfigOrigin) {
        match Self::config_path() {
            Some(config_path) => Self::load_from(&config_path),
            None => {
                warn!("No config directory on this system, using defaults");
                (Self::default(), ConfigOrigin::Defaults)
            }
        }
    }

    pub fn load_from(config_path: &PathBuf) -> (Self, ConfigOrigin) {
        if !config_path.exists() {
            return (Self::default(), ConfigOrigin::Defaults);
        }

        let parsed = std::fs::File::open(config_path)
            .map_err(|e| warn!("Could not open config file {:?}: {}", config_path, e))
            .ok()
            .and_then(|file| {
                serde_json::from_reader(file)
                    .map_err(|e| warn!("Could not parse config file {:?}: {}", config_path, e))
                    .ok()
            });
        match parsed {
            Some(config) => (config, ConfigOrigin::File),
            None => (Self::default(), ConfigOrigin::Unreadable),
        }
    }

    /// Write the config back where [`Self::load_local`] found it. A file that
    /// could not be read is left alone so a typo is never replaced with
    /// defaults. Returns whether anything was written.
    pub fn save_back(&self, origin: ConfigOrigin) -> Result<bool, ConsoleError> {
        let config_path = Self::config_path().ok_or(ConsoleError::NoConfigDir)?;
        self.save_back_to(origin, &config_path)
    }

    pub fn save_back_to(&self, origin: ConfigOrigin, config_path: &PathBuf) -> Result<bool, ConsoleError> {
        if origin == ConfigOrigin::Unreadable {
            info!("Leaving unreadable config file {:?} untouched", config_path);
            return Ok(false);
        }
        self.save_to(config_path)?;
        Ok(true)
    }

    pub fn save_to(&self, config_path: &PathBuf) -> Result<(), ConsoleError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConsoleError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| ConsoleError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| ConsoleError::ConfigSerializeError { source: e })
    }

    /// Pick the backend base URL: command line first, then the environment,
    /// then the config file.
    pub fn resolve_api_base_url(&self, cli_value: Option<String>) -> Option<String> {
        let env_value = std::env::var(API_BASE_URL_ENV).ok();
        let chosen = pick_base_url(cli_value, env_value, self.api_base_url.clone());
        if let Some(url) = &chosen {
            info!("Backend base URL: {}", url);
        }
        chosen
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_s.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s.max(1))
    }
}

fn pick_base_url(
    cli_value: Option<String>,
    env_value: Option<String>,
    file_value: Option<String>,
) -> Option<String> {
    [cli_value, env_value, file_value]
        .into_iter()
        .flatten()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_url_precedence() {
        let cli = Some("https://cli".to_string());
        let env = Some("https://env".to_string());
        let file = Some("https://file".to_string());
        assert_eq!(
            pick_base_url(cli, env.clone(), file.clone()).as_deref(),
            Some("https://cli")
        );
        assert_eq!(
            pick_base_url(None, env, file.clone()).as_deref(),
            Some("https://env")
        );
        assert_eq!(
            pick_base_url(Some("  ".to_string()), None, file).as_deref(),
            Some("https://file")
        );
        assert_eq!(pick_base_url(None, None, None), None);
    }

    #[test]
    fn test_config_round_trip_and_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            api_base_url: Some("https://dock.example".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path), (config, ConfigOrigin::File));

        std::fs::write(&path, r#"{"poll_interval_s": 5}"#).unwrap();
        let (partial, origin) = AppConfig::load_from(&path);
        assert_eq!(origin, ConfigOrigin::File);
        assert_eq!(partial.poll_interval(), Duration::from_secs(5));
        assert_eq!(partial.request_timeout_s, DEFAULT_REQUEST_TIMEOUT_S);
        assert_eq!(partial.api_base_url, None);
    }

    #[test]
    fn test_unreadable_config_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(
            AppConfig::load_from(&path),
            (AppConfig::default(), ConfigOrigin::Unreadable)
        );
        assert_eq!(
            AppConfig::load_from(&temp_dir.path().join("missing.json")),
            (AppConfig::default(), ConfigOrigin::Defaults)
        );
    }

    #[test]
    fn test_unreadable_config_is_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        let typo = r#"{"api_base_url": "https://dock.example",}"#;
        std::fs::write(&path, typo).unwrap();

        let (config, origin) = AppConfig::load_from(&path);
        assert!(!config.save_back_to(origin, &path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), typo);
    }

    #[test]
    fn test_missing_config_is_written_on_save_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let (config, origin) = AppConfig::load_from(&path);
        assert!(config.save_back_to(origin, &path).unwrap());
        assert_eq!(AppConfig::load_from(&path), (config, ConfigOrigin::File));
    }

    #[test]
    fn test_default_poll_interval_is_two_minutes() {
        assert_eq!(AppConfig::default().poll_interval(), Duration::from_secs(120));
    }
}
