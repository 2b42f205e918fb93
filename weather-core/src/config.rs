use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

/// Environment variable overriding the HTTP listen address.
pub const LISTEN_ENV: &str = "WEATHER_LISTEN";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Per-request timeout for upstream providers. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: None,
            providers: HashMap::new(),
        }
    }
}

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
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

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for id in ProviderId::all() {
            if let Some(key) = lookup(id.api_key_env()) {
                self.upsert_provider_api_key(*id, key);
            }
        }

        if let Some(listen) = lookup(LISTEN_ENV) {
            self.listen = listen
                .parse()
                .with_context(|| format!("Invalid {LISTEN_ENV} address: '{listen}'"))?;
        }

        Ok(())
    }

    /// Set/replace a provider API key, keeping any custom base URL.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn defaults_listen_on_8080() {
        let cfg = Config::default();
        assert_eq!(cfg.listen.to_string(), "0.0.0.0:8080");
        assert!(cfg.request_timeout_secs.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn set_api_key_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
        assert!(!cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn upsert_keeps_custom_base_url() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "weatherapi".to_string(),
            ProviderConfig { api_key: "OLD".into(), base_url: Some("http://proxy".into()) },
        );

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "NEW".into());

        let provider = cfg.provider_config(ProviderId::WeatherApi).unwrap();
        assert_eq!(provider.api_key, "NEW");
        assert_eq!(provider.base_url.as_deref(), Some("http://proxy"));
    }

    #[test]
    fn env_overrides_keys_and_listen() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FROM_FILE".into());

        cfg.apply_env_with(|name| match name {
            "OPENWEATHER_API_KEY" => Some("FROM_ENV".to_string()),
            "WEATHERAPI_API_KEY" => Some("   ".to_string()),
            "WEATHER_LISTEN" => Some("127.0.0.1:9000".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("FROM_ENV"));
        assert!(!cfg.is_provider_configured(ProviderId::WeatherApi));
        assert_eq!(cfg.listen.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn env_rejects_bad_listen_address() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_with(|name| (name == LISTEN_ENV).then(|| "nowhere".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("Invalid WEATHER_LISTEN address"));
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
listen = "127.0.0.1:3000"
request_timeout_secs = 5

[providers.openweather]
api_key = "OW"

[providers.weatherapi]
api_key = "WA"
base_url = "http://localhost:1234"
"#,
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.listen.port(), 3000);
        assert_eq!(cfg.request_timeout_secs, Some(5));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OW"));
        assert_eq!(
            cfg.provider_config(ProviderId::WeatherApi).and_then(|p| p.base_url.as_deref()),
            Some("http://localhost:1234")
        );
    }

    #[test]
    fn save_then_load_preserves_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WA".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider_api_key(ProviderId::WeatherApi), Some("WA"));
        assert_eq!(loaded.listen, cfg.listen);
    }

    #[test]
    fn malformed_file_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listen = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
