use crate::constants::DEFAULT_GEOCODE_URL;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Deployment tuning that lives outside the per-run input: HTTP behaviour
/// and where the local sinks write. Loaded from `config.toml` when present;
/// an absent file means defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub geocode_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dataset_dir: String,
    pub key_value_dir: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            // Nominatim's usage policy wants an identifying agent with a contact
            user_agent: "kuyy-scraper/0.1 (contact: example@example.com)".to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dataset_dir: "storage/dataset".to_string(),
            key_value_dir: "storage/key_value".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = AppConfig::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.http.geocode_url, DEFAULT_GEOCODE_URL);
        assert_eq!(config.storage.dataset_dir, "storage/dataset");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [http]
            timeout_seconds = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.http.timeout_seconds, 5);
        // untouched sections fall back
        assert_eq!(config.storage.key_value_dir, "storage/key_value");
        assert!(config.http.user_agent.starts_with("kuyy-scraper/"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
