/// Settings loader - parses riverdash.toml
///
/// Keeps endpoint roots, request deadlines and the dashboard file location
/// out of the code so they can be changed without recompiling.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::GaugeError;

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "riverdash.toml";

pub const DEFAULT_USGS_BASE_URL: &str = "https://waterservices.usgs.gov/nwis";
pub const DEFAULT_NWPS_BASE_URL: &str = "https://api.water.noaa.gov/nwps/v1";

/// Root settings structure for TOML parsing. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub sources: SourceSettings,
    pub timeouts: TimeoutSettings,
    pub series: SeriesSettings,
    pub dashboard: DashboardSettings,
}

/// Endpoint roots for the two public data providers
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    pub usgs_base_url: String,
    pub nwps_base_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            usgs_base_url: DEFAULT_USGS_BASE_URL.to_string(),
            nwps_base_url: DEFAULT_NWPS_BASE_URL.to_string(),
        }
    }
}

/// Request deadlines, in seconds
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Site directory and instantaneous-value lookups
    pub lookup_secs: u64,
    /// Forecast metadata + stageflow pair
    pub forecast_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            lookup_secs: 15,
            forecast_secs: 20,
        }
    }
}

impl TimeoutSettings {
    pub fn lookup(&self) -> Duration {
        Duration::from_secs(self.lookup_secs)
    }

    pub fn forecast(&self) -> Duration {
        Duration::from_secs(self.forecast_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeriesSettings {
    /// ISO 8601 lookback period for instantaneous values.
    pub period: String,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            period: "PT3H".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    /// JSON file holding the saved gauge list and theme.
    pub path: PathBuf,
    /// Worker threads used when refreshing every gauge at once.
    pub workers: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dashboard.json"),
            workers: 4,
        }
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings, GaugeError> {
    toml::from_str(contents).map_err(|e| GaugeError::Config(format!("invalid settings: {}", e)))
}

/// Loads settings from `path`. A missing file yields the defaults; an
/// unreadable or malformed file is an error.
pub fn load_settings_from(path: &Path) -> Result<Settings, GaugeError> {
    if !path.exists() {
        log::debug!("{} not found, using default settings", path.display());
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path)?;
    parse_settings(&contents)
        .map_err(|e| GaugeError::Config(format!("{}: {}", path.display(), e)))
}

/// Loads settings from `RIVERDASH_CONFIG` (or `riverdash.toml`), then
/// applies `USGS_BASE_URL` / `NWPS_BASE_URL` overrides from the
/// environment or a `.env` file.
pub fn load_settings() -> Result<Settings, GaugeError> {
    dotenv::dotenv().ok();

    let path = env::var("RIVERDASH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut settings = load_settings_from(Path::new(&path))?;
    apply_env_overrides(&mut settings, |key| env::var(key).ok());
    Ok(settings)
}

/// Applies endpoint overrides using `lookup` to read variables.
fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("USGS_BASE_URL").filter(|u| !u.trim().is_empty()) {
        settings.sources.usgs_base_url = url;
    }
    if let Some(url) = lookup("NWPS_BASE_URL").filter(|u| !u.trim().is_empty()) {
        settings.sources.nwps_base_url = url;
    }
}
