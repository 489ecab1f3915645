/// Level, trend and freshness derivation.
///
/// Turns a series (fetched or computed) into a `GaugeSummary`. Purely
/// functional: no I/O and no errors. Missing or unusable data degrades to
/// absent fields.
///
/// # Trend
/// Up to three reference readings are sampled: the latest, the one closest
/// to an hour before it and the one closest to two hours before it. The
/// trend is the mean of the hourly rates between consecutive references,
/// ignoring pairs less than 0.1 h apart, rounded to two decimals.

use chrono::{DateTime, Duration, Utc};

use crate::model::{GaugeSummary, Series, TimeSeriesPoint};

/// Reference readings sampled behind the latest one.
const TREND_HOURS_BACK: i64 = 2;

/// Pairs closer together than this are ignored when averaging rates.
pub const MIN_TREND_GAP_HOURS: f64 = 0.1;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Derives the current summary for a series.
///
/// Level and `updated` come from the last point. A NaN last value (from an
/// undefined operator result) reports no level. `frozen` always passes
/// through.
pub fn derive(series: &Series) -> GaugeSummary {
    let Some(latest) = series.latest() else {
        return GaugeSummary {
            frozen: series.frozen,
            ..GaugeSummary::absent()
        };
    };

    GaugeSummary {
        level: (!latest.value.is_nan()).then_some(latest.value),
        trend: calculate_trend(&series.points),
        updated: Some(latest.timestamp),
        frozen: series.frozen,
    }
}

/// Smoothed hourly rate of change over the last two hours.
///
/// Returns `None` with fewer than two points, when the latest value is NaN,
/// or when no pair of reference readings is at least
/// `MIN_TREND_GAP_HOURS` apart. Points must be in ascending time order.
pub fn calculate_trend(points: &[TimeSeriesPoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    let latest = points.last()?;
    if latest.value.is_nan() {
        return None;
    }

    let mut references = vec![*latest];
    for hours_back in 1..=TREND_HOURS_BACK {
        let target = latest.timestamp - Duration::hours(hours_back);
        match find_closest(points, target) {
            Some(reading) if !reading.value.is_nan() => references.push(*reading),
            _ => break,
        }
    }

    if references.len() < 2 {
        return None;
    }

    let rates: Vec<f64> = references
        .windows(2)
        .filter_map(|pair| {
            let (newer, older) = (pair[0], pair[1]);
            let hours = (newer.timestamp - older.timestamp).num_milliseconds() as f64 / MS_PER_HOUR;
            (hours >= MIN_TREND_GAP_HOURS).then(|| (newer.value - older.value) / hours)
        })
        .collect();

    if rates.is_empty() {
        return None;
    }

    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    Some(round_hundredths(mean))
}

/// Reading closest in time to `target`.
///
/// Scans from newest to oldest and stops at the first reading that is
/// both older than `target` and no closer than the best so far.
pub fn find_closest(points: &[TimeSeriesPoint], target: DateTime<Utc>) -> Option<&TimeSeriesPoint> {
    let mut closest: Option<&TimeSeriesPoint> = None;
    let mut closest_diff = i64::MAX;

    for point in points.iter().rev() {
        let diff = (point.timestamp - target).num_milliseconds().abs();
        if diff < closest_diff {
            closest = Some(point);
            closest_diff = diff;
        } else if point.timestamp < target {
            break;
        }
    }

    closest
}

/// Rounds to two decimals, halves toward positive infinity.
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
