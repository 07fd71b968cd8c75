use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{coordinator::RacePolicy, model::Coordinates};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Provider base URLs. Overridable so tests and proxies can point elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    #[serde(default = "default_weather_base")]
    pub weather_base: String,
    #[serde(default = "default_geo_base")]
    pub geo_base: String,
}

fn default_weather_base() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self { weather_base: default_weather_base(), geo_base: default_geo_base() }
    }
}

/// Fixed device position used in place of a browser geolocation prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationConfig> for Coordinates {
    fn from(value: LocationConfig) -> Self {
        Coordinates { latitude: value.latitude, longitude: value.longitude }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Client-level request timeout. Absent means the HTTP client default.
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub race_policy: RacePolicy,

    #[serde(default)]
    pub endpoints: Endpoints,

    /// Example TOML:
    /// [location]
    /// latitude = 48.85
    /// longitude = 2.35
    pub location: Option<LocationConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Result<String> {
        let from_env = std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty());
        Self::pick_api_key(from_env, self.api_key.as_deref())
    }

    fn pick_api_key(from_env: Option<String>, stored: Option<&str>) -> Result<String> {
        from_env.or_else(|| stored.map(str::to_owned)).ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weather-dashboard configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        self.location = Some(LocationConfig { latitude, longitude });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_has_hint() {
        let err = Config::pick_api_key(None, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("weather-dashboard configure"));
    }

    #[test]
    fn environment_key_wins_over_stored_key() {
        let key = Config::pick_api_key(Some("ENV".into()), Some("FILE")).unwrap();
        assert_eq!(key, "ENV");

        let key = Config::pick_api_key(None, Some("FILE")).unwrap();
        assert_eq!(key, "FILE");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::from_toml("").expect("empty config parses");
        assert!(cfg.api_key.is_none());
        assert!(cfg.location.is_none());
        assert_eq!(cfg.race_policy, RacePolicy::LastWriteWins);
        assert_eq!(cfg.endpoints, Endpoints::default());
    }

    #[test]
    fn full_file_parses() {
        let cfg = Config::from_toml(
            r#"
            api_key = "KEY"
            timeout_secs = 5
            race_policy = "latest-request-wins"

            [endpoints]
            weather_base = "http://localhost:1234/data"

            [location]
            latitude = 48.85
            longitude = 2.35
            "#,
        )
        .expect("config parses");

        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.timeout_secs, Some(5));
        assert_eq!(cfg.race_policy, RacePolicy::LatestRequestWins);
        assert_eq!(cfg.endpoints.weather_base, "http://localhost:1234/data");
        assert_eq!(cfg.endpoints.geo_base, default_geo_base());
        assert_eq!(cfg.location, Some(LocationConfig { latitude: 48.85, longitude: 2.35 }));
    }

    #[test]
    fn set_location_round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.set_location(52.52, 13.40);

        let text = toml::to_string_pretty(&cfg).expect("serializes");
        let back = Config::from_toml(&text).expect("parses back");
        assert_eq!(back.location, cfg.location);
    }
}
