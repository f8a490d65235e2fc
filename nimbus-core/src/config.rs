use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::error::SourceError;
use crate::source::SourceId;

/// Configuration for a single weather source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// User-supplied API key; falls back to the source's compiled-in
    /// default key when absent.
    pub api_key: Option<String>,
    /// Custom base URL for self-hosted or regional instances.
    pub instance_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default source id, e.g. "openweather" or "brightsky".
    pub default_source: Option<String>,

    /// Example TOML:
    /// [sources.openweather]
    /// api_key = "..."
    pub sources: HashMap<String, SourceConfig>,
}

impl Config {
    /// Return the default source as a strongly-typed SourceId.
    pub fn default_source_id(&self) -> Result<SourceId> {
        let s = self.default_source.as_ref().ok_or_else(|| {
            anyhow!(
                "No default source configured.\n\
                 Hint: run `nimbus configure <source>` (e.g. `nimbus configure openweather`) first."
            )
        })?;

        SourceId::try_from(s.as_str())
    }

    pub fn source_config(&self, id: SourceId) -> Option<&SourceConfig> {
        self.sources.get(id.as_str())
    }

    pub fn set_default_source(&mut self, id: SourceId) {
        self.default_source = Some(id.as_str().to_string());
    }

    /// Effective API key after default-key fallback. An empty key after
    /// fallback short-circuits with `ApiKeyMissing` so a request that is
    /// guaranteed to fail remotely is never sent.
    pub fn effective_api_key(
        &self,
        id: SourceId,
        default_key: Option<&str>,
    ) -> std::result::Result<String, SourceError> {
        let configured = self
            .source_config(id)
            .and_then(|c| c.api_key.as_deref())
            .filter(|k| !k.trim().is_empty());

        configured
            .or(default_key.filter(|k| !k.trim().is_empty()))
            .map(str::to_owned)
            .ok_or(SourceError::ApiKeyMissing)
    }

    /// Effective base URL: user-configured instance or the compiled-in
    /// default, trailing slashes trimmed.
    pub fn effective_instance(&self, id: SourceId, default_url: &str) -> String {
        self.source_config(id)
            .and_then(|c| c.instance_url.as_deref())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(default_url)
            .trim_end_matches('/')
            .to_string()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "nimbus", "nimbus-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a source API key and optionally set the default source.
    pub fn upsert_source_api_key(&mut self, id: SourceId, api_key: String) {
        self.sources
            .entry(id.as_str().to_string())
            .or_default()
            .api_key = Some(api_key);

        if self.default_source.is_none() {
            self.default_source = Some(id.to_string());
        }
    }

    pub fn set_instance_url(&mut self, id: SourceId, url: String) {
        self.sources
            .entry(id.as_str().to_string())
            .or_default()
            .instance_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_source_id().unwrap_err();

        assert!(err.to_string().contains("No default source configured"));
    }

    #[test]
    fn set_api_key_and_default_for_source() {
        let mut cfg = Config::default();

        cfg.upsert_source_api_key(SourceId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_source_id().expect("default source must exist");
        assert_eq!(default, SourceId::OpenWeather);

        let key = cfg.effective_api_key(SourceId::OpenWeather, None).unwrap();
        assert_eq!(key, "OPEN_KEY");
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_source_api_key(SourceId::OpenWeather, "OPEN_KEY".into());
        cfg.upsert_source_api_key(SourceId::PirateWeather, "PIRATE_KEY".into());

        let default = cfg.default_source_id().expect("default source must exist");
        assert_eq!(default, SourceId::OpenWeather);
    }

    #[test]
    fn empty_key_after_fallback_is_missing_credentials() {
        let mut cfg = Config::default();
        cfg.upsert_source_api_key(SourceId::OpenWeather, "   ".into());

        let err = cfg.effective_api_key(SourceId::OpenWeather, None).unwrap_err();
        assert_eq!(err, SourceError::ApiKeyMissing);

        // A blank user key still falls back to the compiled-in default.
        let key = cfg
            .effective_api_key(SourceId::OpenWeather, Some("DEFAULT"))
            .unwrap();
        assert_eq!(key, "DEFAULT");
    }

    #[test]
    fn instance_url_fallback_and_trim() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.effective_instance(SourceId::BrightSky, "https://api.brightsky.dev/"),
            "https://api.brightsky.dev"
        );
        cfg.set_instance_url(SourceId::BrightSky, "https://own.example.org/brightsky/".into());
        assert_eq!(
            cfg.effective_instance(SourceId::BrightSky, "https://api.brightsky.dev/"),
            "https://own.example.org/brightsky"
        );
    }
}
