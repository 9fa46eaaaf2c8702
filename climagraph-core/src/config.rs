use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;

/// Upper bound on each call to a live provider. A lookup makes two calls
/// (current conditions, then forecast), each bounded separately.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Optional endpoint override, e.g. a proxy or a local mock server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// A missing file is an empty config, which runs ClimaGraph on the
/// synthetic generator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Where the report history lives; defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Provider to use for live lookups: the explicit default, else the first
    /// provider that has credentials.
    pub fn active_provider_id(&self) -> Result<Option<ProviderId>> {
        if let Some(s) = &self.default_provider {
            return ProviderId::try_from(s.as_str()).map(Some);
        }

        Ok(ProviderId::all()
            .iter()
            .copied()
            .find(|id| self.is_provider_configured(*id)))
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from an explicit path, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Fill in API keys from the environment for providers the file leaves unset.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in ProviderId::all() {
            if self.is_provider_configured(*id) {
                continue;
            }
            if let Some(key) = lookup(id.api_key_env_var()).filter(|k| !k.trim().is_empty()) {
                let entry = self.providers.entry(id.as_str().to_string()).or_default();
                entry.api_key = key.trim().to_string();
            }
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "climagraph", "climagraph")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding persisted report history.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let entry = self.providers.entry(provider_id.as_str().to_string()).or_default();
        entry.api_key = api_key;

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns a non-empty API key for a provider, if present.
    pub fn resolve_api_key(&self, provider_id: ProviderId) -> Option<String> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.resolve_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn empty_config_has_no_active_provider() {
        let cfg = Config::default();
        assert_eq!(cfg.active_provider_id().unwrap(), None);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.active_provider_id().unwrap();
        assert_eq!(default, Some(ProviderId::OpenWeather));

        let key = cfg.resolve_api_key(ProviderId::OpenWeather);
        assert_eq!(key.as_deref(), Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "openweather".into(),
            ProviderConfig {
                api_key: "   ".into(),
                base_url: None,
            },
        );
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn env_override_fills_missing_key_only() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(|name| {
            (name == "OPENWEATHER_API_KEY").then(|| "ENV_KEY".to_string())
        });
        assert_eq!(cfg.resolve_api_key(ProviderId::OpenWeather).as_deref(), Some("ENV_KEY"));

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FILE_KEY".into());
        cfg.apply_env_overrides(|_| Some("ENV_KEY".to_string()));
        assert_eq!(cfg.resolve_api_key(ProviderId::OpenWeather).as_deref(), Some("FILE_KEY"));
    }

    #[test]
    fn parses_full_toml() {
        let cfg: Config = toml::from_str(
            r#"
            default_provider = "openweather"
            request_timeout_secs = 5
            data_dir = "/tmp/climagraph"

            [providers.openweather]
            api_key = "KEY"
            base_url = "http://localhost:8080"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.active_provider_id().unwrap(), Some(ProviderId::OpenWeather));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.data_dir().unwrap(), PathBuf::from("/tmp/climagraph"));
        assert_eq!(
            cfg.provider_base_url(ProviderId::OpenWeather),
            Some("http://localhost:8080")
        );
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "providers = [[[").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
