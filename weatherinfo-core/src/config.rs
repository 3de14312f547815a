use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    fetch::{DEFAULT_BASE_URL, OpenWeatherClient},
    model::{LocationFix, PermissionState, Units},
    screen::QuerySettings,
};

/// Where the host gets its position from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    /// Approximate position from the public IP address.
    #[default]
    IpLookup,
    Fixed {
        latitude: f64,
        longitude: f64,
    },
}

/// The user's stored answer to the location-access question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consent {
    Granted,
    Denied,
}

impl From<Option<Consent>> for PermissionState {
    fn from(consent: Option<Consent>) -> Self {
        match consent {
            Some(Consent::Granted) => PermissionState::Granted,
            Some(Consent::Denied) => PermissionState::Denied,
            None => PermissionState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Location services switch; off means no provider is usable.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Example TOML:
    /// [location]
    /// consent = "granted"
    pub consent: Option<Consent>,

    #[serde(default)]
    pub source: LocationSource,
}

fn default_enabled() -> bool {
    true
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), consent: None, source: LocationSource::default() }
    }
}

impl LocationConfig {
    pub fn fixed_fix(&self) -> Option<LocationFix> {
        match self.source {
            LocationSource::Fixed { latitude, longitude } => {
                Some(LocationFix::new(latitude, longitude))
            }
            LocationSource::IpLookup => None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Override for the API base, e.g. "http://api.openweathermap.org/data".
    pub base_url: Option<String>,

    #[serde(default)]
    pub units: Units,

    #[serde(default)]
    pub location: LocationConfig,
}

impl Config {
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weatherinfo configure` and enter your API key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn query_settings(&self) -> Result<QuerySettings> {
        Ok(QuerySettings { units: self.units, api_key: self.api_key()?.to_string() })
    }

    pub fn weather_client(&self) -> Result<OpenWeatherClient> {
        OpenWeatherClient::with_base_url(self.base_url())
            .with_context(|| format!("Invalid weather API base URL: {}", self.base_url()))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

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

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

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

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherinfo", "weatherinfo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No OpenWeather API key configured"));
        assert!(err.to_string().contains("weatherinfo configure"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());

        assert!(cfg.api_key().is_err());
        assert!(cfg.query_settings().is_err());
    }

    #[test]
    fn query_settings_carry_units_and_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.units = Units::Imperial;

        let settings = cfg.query_settings().expect("settings must build");
        assert_eq!(settings, QuerySettings { units: Units::Imperial, api_key: "KEY".into() });
    }

    #[test]
    fn defaults_point_at_openweather_with_ip_lookup() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.units, Units::Metric);
        assert!(cfg.location.enabled);
        assert_eq!(cfg.location.source, LocationSource::IpLookup);
        assert_eq!(PermissionState::from(cfg.location.consent), PermissionState::Unknown);
        assert!(cfg.location.fixed_fix().is_none());
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let cfg = Config { base_url: Some("::nope".into()), ..Config::default() };
        let err = cfg.weather_client().unwrap_err();
        assert!(err.to_string().contains("Invalid weather API base URL"));
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn save_and_load_preserve_location_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.units = Units::Imperial;
        cfg.location.enabled = false;
        cfg.location.source = LocationSource::Fixed { latitude: 12.9, longitude: 77.6 };
        cfg.location.consent = Some(Consent::Denied);
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key().unwrap(), "KEY");
        assert_eq!(loaded.units, Units::Imperial);
        assert!(!loaded.location.enabled);
        assert_eq!(loaded.location.fixed_fix(), Some(LocationFix::new(12.9, 77.6)));
        assert_eq!(PermissionState::from(loaded.location.consent), PermissionState::Denied);
    }

    #[test]
    fn hand_written_toml_parses() {
        let toml = r#"
            api_key = "abc"
            units = "imperial"

            [location]
            consent = "granted"
            source = { kind = "fixed", latitude = 1.5, longitude = -2.25 }
        "#;

        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.units, Units::Imperial);
        assert!(cfg.location.enabled);
        assert_eq!(cfg.location.consent, Some(Consent::Granted));
        assert_eq!(cfg.location.fixed_fix(), Some(LocationFix::new(1.5, -2.25)));
    }
}
