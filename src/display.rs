//! Presentation rules shared by every caller that renders a gauge.
//!
//! A trend is "flat" when it is exactly zero, or for stage readings when it
//! is within 0.1 ft/hr of zero. Levels are judged against the optional
//! min/max the user configured for the gauge.

use chrono::{DateTime, Utc};

use crate::model::{GaugeSummary, Unit};

/// Stage trends this close to zero read as flat.
pub const STAGE_FLAT_BAND_FT: f64 = 0.1;

pub const MISSING: &str = "—";

pub const FROZEN_LABEL: &str = "Gauge Frozen (Estimated)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    InRange,
    OutOfRange,
    /// Neither bound configured.
    Unbounded,
    Unknown,
}

pub fn is_flat(trend: f64, unit: Unit) -> bool {
    trend == 0.0 || (unit == Unit::Stage && trend.abs() <= STAGE_FLAT_BAND_FT)
}

pub fn trend_direction(trend: Option<f64>, unit: Unit) -> TrendDirection {
    match trend {
        None => TrendDirection::Unknown,
        Some(t) if t.is_nan() => TrendDirection::Unknown,
        Some(t) if is_flat(t, unit) => TrendDirection::Flat,
        Some(t) if t > 0.0 => TrendDirection::Rising,
        Some(_) => TrendDirection::Falling,
    }
}

/// Compares a level to the configured bounds. A level equal to `min` or
/// `max` is in range.
pub fn level_status(level: Option<f64>, min: Option<f64>, max: Option<f64>) -> LevelStatus {
    let Some(level) = level else {
        return LevelStatus::Unknown;
    };
    if min.is_none() && max.is_none() {
        return LevelStatus::Unbounded;
    }
    if min.is_some_and(|m| level < m) || max.is_some_and(|m| level > m) {
        LevelStatus::OutOfRange
    } else {
        LevelStatus::InRange
    }
}

/// `42,300 cfs`, `18.42 ft`, or `—`.
pub fn format_level(level: Option<f64>, unit: Unit) -> String {
    match level {
        None => MISSING.to_string(),
        Some(v) => match unit {
            Unit::Flow => format!("{} cfs", group_thousands(v.round() as i64)),
            Unit::Stage => format!("{:.2} ft", v),
        },
    }
}

/// `⬆ 300 cfs/hr`, `⬇ 0.25 ft/hr`, `Flat`, or `—`.
pub fn format_trend(trend: Option<f64>, unit: Unit) -> String {
    let Some(t) = trend.filter(|t| !t.is_nan()) else {
        return MISSING.to_string();
    };
    if is_flat(t, unit) {
        return "Flat".to_string();
    }

    let arrow = if t > 0.0 { "⬆" } else { "⬇" };
    match unit {
        Unit::Flow => format!("{} {} cfs/hr", arrow, group_thousands(t.abs().round() as i64)),
        Unit::Stage => format!("{} {:.2} ft/hr", arrow, t.abs()),
    }
}

/// Clock time of the reading, in UTC.
pub fn format_updated(updated: Option<DateTime<Utc>>) -> String {
    updated
        .map(|t| t.format("%H:%M UTC").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Level cell text: the frozen label when the gauge is iced over and
/// reports no level, otherwise the formatted level.
pub fn level_cell(summary: &GaugeSummary, unit: Unit) -> String {
    if summary.frozen && summary.level.is_none() {
        FROZEN_LABEL.to_string()
    } else {
        format_level(summary.level, unit)
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
