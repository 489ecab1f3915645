//! Core data types for the river gauge dashboard.
//!
//! This module defines the shared domain model imported by all other modules:
//! raw series, operator chains, derived summaries, forecasts and the error
//! taxonomy. It performs no I/O.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for discharge (streamflow), in cubic feet per second.
pub const PARAM_DISCHARGE: &str = "00060";

/// USGS parameter code for gage height (stage), in feet.
pub const PARAM_STAGE: &str = "00065";

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// The two measurements a gauge can be tracked in.
///
/// Serialized as `"cfs"` / `"ft"` to match the persisted gauge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "cfs")]
    Flow,
    #[serde(rename = "ft")]
    Stage,
}

impl Unit {
    /// USGS parameter code requested for this unit.
    pub fn param_code(self) -> &'static str {
        match self {
            Unit::Flow => PARAM_DISCHARGE,
            Unit::Stage => PARAM_STAGE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Flow => "cfs",
            Unit::Stage => "ft",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = GaugeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cfs" | "flow" | "discharge" => Ok(Unit::Flow),
            "ft" | "stage" | "height" => Ok(Unit::Stage),
            other => Err(GaugeError::Config(format!("unknown unit '{}'", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// One instantaneous measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A recent run of readings for one gauge and parameter.
///
/// `points` are ordered ascending by timestamp. Sentinel and non-numeric
/// values never make it into a fetched series; derived series may contain
/// NaN where an operator was undefined (division by zero).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub gauge_id: String,
    pub display_name: String,
    pub unit: Unit,
    pub points: Vec<TimeSeriesPoint>,
    /// Source flagged at least one raw value as ice-affected.
    pub frozen: bool,
}

impl Series {
    /// An empty, non-frozen series named after the gauge itself.
    pub fn empty(gauge_id: &str, unit: Unit) -> Self {
        Self {
            gauge_id: gauge_id.to_string(),
            display_name: gauge_id.to_string(),
            unit,
            points: Vec::new(),
            frozen: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest().map(|p| p.timestamp)
    }

    /// Same identity (id, name, unit, frozen flag) carrying new points.
    pub fn with_points(&self, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            gauge_id: self.gauge_id.clone(),
            display_name: self.display_name.clone(),
            unit: self.unit,
            points,
            frozen: self.frozen,
        }
    }
}

// ---------------------------------------------------------------------------
// Operator chains
// ---------------------------------------------------------------------------

/// Arithmetic applied point-by-point in a custom gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    /// Applies `a <op> b`. Division by zero yields NaN rather than infinity.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => {
                if b != 0.0 {
                    a / b
                } else {
                    f64::NAN
                }
            }
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of one step in a custom gauge chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(f64),
    /// Scalar text with no leading number.
    Unparsed(String),
    /// Another gauge's series, aligned by timestamp.
    Gauge(String),
}

impl Operand {
    /// Parses user-entered scalar text by its longest leading number, so
    /// `"2.5 cfs"` reads as 2.5 and `"Infinity"` as infinity. Text with no
    /// leading number is kept raw.
    pub fn parse_scalar(text: &str) -> Self {
        match leading_number(text) {
            Some(v) => Operand::Scalar(v),
            None => Operand::Unparsed(text.to_string()),
        }
    }
}

/// Longest numeric prefix of `text` after leading whitespace:
/// `[+-]? (Infinity | digits [. digits] | . digits) [e [+-] digits]`.
fn leading_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorStep {
    pub operator: Operator,
    pub operand: Operand,
}

/// A custom gauge: a base gauge followed by a flat left-to-right chain of
/// steps. There is no precedence or grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomGaugeExpression {
    pub base_gauge_id: String,
    pub steps: Vec<OperatorStep>,
}

// ---------------------------------------------------------------------------
// Derived output
// ---------------------------------------------------------------------------

/// Current level, hourly trend and freshness for one gauge.
///
/// Every field is optional: missing data degrades to an absent field, never
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GaugeSummary {
    pub level: Option<f64>,
    /// Signed rate of change per hour, rounded to two decimals.
    pub trend: Option<f64>,
    pub updated: Option<DateTime<Utc>>,
    pub frozen: bool,
}

impl GaugeSummary {
    /// Summary with no level, trend or timestamp.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.level.is_none() && self.trend.is_none() && self.updated.is_none()
    }
}

/// Result of evaluating a plain (non-custom) gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeReading {
    pub gauge_id: String,
    /// Site name reported by the source, or the gauge id.
    pub site_name: String,
    pub unit: Unit,
    #[serde(flatten)]
    pub summary: GaugeSummary,
}

/// An entry in a region's gauge directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteEntry {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Forecast types
// ---------------------------------------------------------------------------

/// Forecast flow range for one UTC calendar day, in cfs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

/// Up to five days of forecast flow plus the source's gauge metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub daily: Vec<DailyForecast>,
    pub images: BTreeMap<String, serde_json::Value>,
    /// NWS location identifier used by the NOAA gauge pages.
    pub lid: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching gauge data or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum GaugeError {
    /// Transport failure, including the request deadline expiring.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP response.
    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A scalar step in a custom gauge is not a number.
    #[error("Invalid operand at step {step}: '{value}'")]
    InvalidOperand { step: usize, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GaugeError {
    /// True for the failures a caller should treat as "source unreachable".
    pub fn is_network(&self) -> bool {
        matches!(self, GaugeError::Network(_) | GaugeError::HttpStatus { .. })
    }
}

impl From<reqwest::Error> for GaugeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GaugeError::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            GaugeError::Parse(e.to_string())
        } else {
            GaugeError::Network(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
