/// NOAA National Water Prediction Service (NWPS) forecast client.
///
/// Two endpoints per gauge:
///   {base}/gauges/{id}           : metadata (`lid`, `images`)
///   {base}/gauges/{id}/stageflow : observed + forecast stage/flow
///
/// Forecast flow (`secondary`) is reported in kcfs and converted to cfs.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::thread;

use crate::config::Settings;
use crate::ingest::{build_client, get_checked, trim_base};
use crate::model::{DailyForecast, Forecast, GaugeError};

/// Days of forecast kept.
pub const MAX_FORECAST_DAYS: usize = 5;

/// kcfs → cfs
const KCFS_TO_CFS: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GaugeMetadata {
    #[serde(default)]
    lid: Option<String>,
    #[serde(default)]
    images: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct StageflowResponse {
    #[serde(default)]
    forecast: Option<ForecastSection>,
}

#[derive(Debug, Deserialize)]
struct ForecastSection {
    #[serde(default)]
    data: Vec<ForecastPoint>,
}

#[derive(Debug, Deserialize)]
struct ForecastPoint {
    #[serde(rename = "validTime")]
    valid_time: String,
    #[serde(default)]
    secondary: Option<f64>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

pub fn build_gauge_url(base_url: &str, gauge_id: &str) -> String {
    format!("{}/gauges/{}", trim_base(base_url), urlencoding::encode(gauge_id))
}

pub fn build_stageflow_url(base_url: &str, gauge_id: &str) -> String {
    format!("{}/stageflow", build_gauge_url(base_url, gauge_id))
}

/// Primary (HEFS short-range) and fallback (NWRFC) hydrograph image URLs
/// for an NWS location id. `now` busts the fallback plot's cache.
pub fn hydrograph_urls(lid: &str, now: DateTime<Utc>) -> (String, String) {
    let primary = format!(
        "https://water.noaa.gov/resources/probabilistic/short_term/{}.shortrange.hefs.png",
        lid.to_uppercase()
    );
    let fallback = format!(
        "https://www.nwrfc.noaa.gov/station/flowplot/hydroPlot.php?id={}&pe=HG&v={}",
        urlencoding::encode(lid),
        now.timestamp_millis()
    );
    (primary, fallback)
}

/// Public gauge pages: USGS monitoring location, plus NOAA when a
/// location id is known.
pub fn gauge_links(gauge_id: &str, lid: Option<&str>) -> Vec<String> {
    let mut links = vec![format!(
        "https://waterdata.usgs.gov/monitoring-location/USGS-{}/",
        gauge_id
    )];
    if let Some(lid) = lid.filter(|l| !l.is_empty()) {
        links.push(format!("https://water.noaa.gov/gauges/{}", lid));
    }
    links
}

// ---------------------------------------------------------------------------
// Parsing and bucketing
// ---------------------------------------------------------------------------

/// Groups forecast flow (kcfs, `None` read as zero) by UTC calendar day and
/// keeps each day's high and low in cfs. Returns at most five days,
/// ascending by date.
pub fn bucket_daily<I>(points: I) -> Vec<DailyForecast>
where
    I: IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
{
    let mut days: BTreeMap<NaiveDate, DailyForecast> = BTreeMap::new();

    for (valid_time, kcfs) in points {
        let cfs = kcfs.unwrap_or(0.0) * KCFS_TO_CFS;
        let date = valid_time.date_naive();

        days.entry(date)
            .and_modify(|day| {
                day.high = day.high.max(cfs);
                day.low = day.low.min(cfs);
            })
            .or_insert(DailyForecast {
                date,
                high: cfs,
                low: cfs,
            });
    }

    days.into_values().take(MAX_FORECAST_DAYS).collect()
}

/// Parses a stageflow body into daily forecasts. A missing `forecast`
/// section yields no days; points with an unreadable `validTime` are
/// skipped.
pub fn parse_stageflow(json: &str) -> Result<Vec<DailyForecast>, GaugeError> {
    let response: StageflowResponse = serde_json::from_str(json)
        .map_err(|e| GaugeError::Parse(format!("stageflow: {}", e)))?;

    let data = response.forecast.map(|f| f.data).unwrap_or_default();

    let points = data.into_iter().filter_map(|p| {
        match DateTime::parse_from_rfc3339(&p.valid_time) {
            Ok(t) => Some((t.with_timezone(&Utc), p.secondary)),
            Err(e) => {
                log::debug!("skipping forecast point {:?}: {}", p.valid_time, e);
                None
            }
        }
    });

    Ok(bucket_daily(points))
}

/// Parses a gauge metadata body into `(images, lid)`.
pub fn parse_gauge_metadata(
    json: &str,
) -> Result<(BTreeMap<String, serde_json::Value>, String), GaugeError> {
    let meta: GaugeMetadata = serde_json::from_str(json)
        .map_err(|e| GaugeError::Parse(format!("gauge metadata: {}", e)))?;
    Ok((meta.images.unwrap_or_default(), meta.lid.unwrap_or_default()))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Client configured from settings, bounded by the forecast deadline.
    pub fn from_settings(settings: &Settings) -> Result<Self, GaugeError> {
        let client = build_client(settings.timeouts.forecast())?;
        Ok(Self::new(client, &settings.sources.nwps_base_url))
    }

    /// Fetches metadata and stageflow concurrently and combines them.
    ///
    /// Both requests must succeed; the first failure (metadata checked
    /// first) is returned.
    ///
    /// # Errors
    /// - `GaugeError::HttpStatus` / `GaugeError::Network`: either request
    ///   failed or exceeded the deadline.
    /// - `GaugeError::Parse`: either body is not JSON of the expected shape.
    pub fn fetch_forecast(&self, gauge_id: &str) -> Result<Forecast, GaugeError> {
        let gauge_url = build_gauge_url(&self.base_url, gauge_id);
        let stageflow_url = build_stageflow_url(&self.base_url, gauge_id);

        let (gauge_body, stageflow_body) = thread::scope(|s| {
            let gauge = s.spawn(|| self.get_body(&gauge_url));
            let stageflow = s.spawn(|| self.get_body(&stageflow_url));
            (join_fetch(gauge), join_fetch(stageflow))
        });

        let (images, lid) = parse_gauge_metadata(&gauge_body?)?;
        let daily = parse_stageflow(&stageflow_body?)?;

        log::debug!("{}: {} forecast days (lid {:?})", gauge_id, daily.len(), lid);

        Ok(Forecast { daily, images, lid })
    }

    fn get_body(&self, url: &str) -> Result<String, GaugeError> {
        Ok(get_checked(&self.client, url)?.text()?)
    }
}

fn join_fetch(
    handle: thread::ScopedJoinHandle<'_, Result<String, GaugeError>>,
) -> Result<String, GaugeError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(GaugeError::Network("forecast fetch thread panicked".to_string())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
