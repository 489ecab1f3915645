/// USGS NWIS Instantaneous Values (IV) API client.
///
/// Handles URL construction and JSON response parsing for the USGS Water
/// Services IV endpoint:
///   https://waterservices.usgs.gov/nwis/iv/
///
/// The IV service returns WaterML rendered as JSON. See `fixtures.rs` for
/// annotated examples of the response structure.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Settings;
use crate::ingest::{build_client, get_text, trim_base, SeriesSource};
use crate::model::{GaugeError, Series, TimeSeriesPoint, Unit};

/// Qualifier code USGS attaches to ice-affected readings.
pub const ICE_QUALIFIER: &str = "Ice";

// ---------------------------------------------------------------------------
// Serde structures for WaterML JSON deserialization
// ---------------------------------------------------------------------------
//
// Every level is optional: a response missing the nested time series is an
// empty result, not an error.

#[derive(Deserialize)]
struct IvResponse {
    value: Option<ValueWrapper>,
}

#[derive(Deserialize)]
struct ValueWrapper {
    #[serde(rename = "timeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Deserialize)]
struct TimeSeries {
    #[serde(rename = "sourceInfo")]
    source_info: Option<SourceInfo>,
    variable: Option<Variable>,
    #[serde(default)]
    values: Vec<Values>,
}

#[derive(Deserialize)]
struct SourceInfo {
    #[serde(rename = "siteName")]
    site_name: Option<String>,
}

#[derive(Deserialize)]
struct Variable {
    #[serde(rename = "noDataValue")]
    no_data_value: Option<f64>,
}

#[derive(Deserialize)]
struct Values {
    #[serde(default)]
    value: Vec<ValueEntry>,
}

#[derive(Deserialize)]
struct ValueEntry {
    value: Option<serde_json::Value>,  // USGS returns as string!
    #[serde(default)]
    qualifiers: Vec<String>,
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

impl ValueEntry {
    /// Numeric value, if the entry holds one.
    fn numeric(&self) -> Option<f64> {
        let v = match self.value.as_ref()? {
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            serde_json::Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn is_ice_affected(&self) -> bool {
        self.qualifiers.iter().any(|q| q == ICE_QUALIFIER)
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a USGS IV API URL for one site, one parameter code and an
/// ISO 8601 lookback period (e.g. `"PT3H"` for the past three hours).
pub fn build_iv_url(base_url: &str, site: &str, param_code: &str, period: &str) -> String {
    format!(
        "{}/iv/?format=json&sites={}&parameterCd={}&period={}",
        trim_base(base_url),
        urlencoding::encode(site),
        param_code,
        period
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a USGS IV API JSON response body into a `Series`.
///
/// Uses the first `timeSeries` entry. Values equal to the declared
/// `noDataValue`, non-numeric values and entries with an unreadable
/// timestamp are dropped. `frozen` is set when any raw entry carries the
/// `Ice` qualifier, whether or not that entry survives filtering. Points
/// are returned sorted by timestamp.
///
/// # Errors
/// - `GaugeError::Parse`: the body is not JSON of the expected types.
///   A missing `value.timeSeries[0]` is not an error; it yields an empty,
///   non-frozen series.
pub fn parse_iv_response(gauge_id: &str, unit: Unit, json: &str) -> Result<Series, GaugeError> {
    let response: IvResponse = serde_json::from_str(json)
        .map_err(|e| GaugeError::Parse(format!("JSON deserialization failed: {}", e)))?;

    let Some(series) = response
        .value
        .and_then(|v| v.time_series.into_iter().next())
    else {
        return Ok(Series::empty(gauge_id, unit));
    };

    let display_name = series
        .source_info
        .and_then(|s| s.site_name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| gauge_id.to_string());

    let no_data_value = series.variable.and_then(|v| v.no_data_value);

    let raw = series
        .values
        .into_iter()
        .next()
        .map(|v| v.value)
        .unwrap_or_default();

    let frozen = raw.iter().any(ValueEntry::is_ice_affected);

    let mut points: Vec<TimeSeriesPoint> = raw
        .iter()
        .filter_map(|entry| {
            let value = entry.numeric()?;
            if no_data_value == Some(value) {
                return None;
            }
            let Some(timestamp) = entry.timestamp() else {
                log::debug!("{}: dropping entry with unreadable dateTime {:?}", gauge_id, entry.date_time);
                return None;
            };
            Some(TimeSeriesPoint::new(timestamp, value))
        })
        .collect();

    points.sort_by_key(|p| p.timestamp);

    log::debug!(
        "{}: {} of {} raw values kept{}",
        gauge_id,
        points.len(),
        raw.len(),
        if frozen { " (ice affected)" } else { "" }
    );

    Ok(Series {
        gauge_id: gauge_id.to_string(),
        display_name,
        unit,
        points,
        frozen,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fetches recent instantaneous values from USGS.
pub struct UsgsClient {
    client: Client,
    base_url: String,
    period: String,
}

impl UsgsClient {
    pub fn new(client: Client, base_url: &str, period: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            period: period.to_string(),
        }
    }

    /// Client configured from settings, bounded by the lookup deadline.
    pub fn from_settings(settings: &Settings) -> Result<Self, GaugeError> {
        let client = build_client(settings.timeouts.lookup())?;
        Ok(Self::new(
            client,
            &settings.sources.usgs_base_url,
            &settings.series.period,
        ))
    }

    /// Fetches the recent series for `gauge_id` in `unit`.
    ///
    /// # Errors
    /// - `GaugeError::HttpStatus` / `GaugeError::Network`: non-success
    ///   status, transport failure or deadline exceeded.
    /// - `GaugeError::Parse`: body is not the expected JSON.
    pub fn fetch_series(&self, gauge_id: &str, unit: Unit) -> Result<Series, GaugeError> {
        let url = build_iv_url(&self.base_url, gauge_id, unit.param_code(), &self.period);
        let body = get_text(&self.client, &url)?;
        parse_iv_response(gauge_id, unit, &body)
    }
}

impl SeriesSource for UsgsClient {
    fn fetch_series(&self, gauge_id: &str, unit: Unit) -> Result<Series, GaugeError> {
        UsgsClient::fetch_series(self, gauge_id, unit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
