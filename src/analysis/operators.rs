/// Point-wise arithmetic over series.
///
/// `apply_scalar` maps every value through an operator; `align_and_combine`
/// pairs each point of a series with the nearest-in-time point of another
/// series and combines the two values. Neither function fails: undefined
/// results (division by zero) become NaN and unmatched points are dropped.

use crate::model::{Operator, Series, TimeSeriesPoint};

/// Widest gap at which two readings are treated as simultaneous.
pub const ALIGN_TOLERANCE_MS: i64 = 450_000; // 7.5 minutes

/// Applies `value <op> scalar` to every point.
pub fn apply_scalar(series: &Series, operator: Operator, scalar: f64) -> Series {
    let points = series
        .points
        .iter()
        .map(|p| TimeSeriesPoint::new(p.timestamp, operator.apply(p.value, scalar)))
        .collect();
    series.with_points(points)
}

/// Combines `a` with `b` point-by-point.
///
/// For each point of `a`, every point of `b` is scanned for the smallest
/// absolute time difference (first one wins on ties). The pair is kept
/// only when that difference is within `ALIGN_TOLERANCE_MS`; otherwise
/// `a`'s point is dropped. The result carries `a`'s identity and
/// timestamps, so it is never longer than `a`.
pub fn align_and_combine(a: &Series, b: &Series, operator: Operator) -> Series {
    let points = a
        .points
        .iter()
        .filter_map(|pa| {
            let (best, diff) = nearest(&b.points, pa)?;
            (diff <= ALIGN_TOLERANCE_MS)
                .then(|| TimeSeriesPoint::new(pa.timestamp, operator.apply(pa.value, best.value)))
        })
        .collect();
    a.with_points(points)
}

/// Nearest point in `candidates` to `target`, with the gap in milliseconds.
fn nearest<'a>(
    candidates: &'a [TimeSeriesPoint],
    target: &TimeSeriesPoint,
) -> Option<(&'a TimeSeriesPoint, i64)> {
    let mut best: Option<(&TimeSeriesPoint, i64)> = None;
    for candidate in candidates {
        let diff = (candidate.timestamp - target.timestamp).num_milliseconds().abs();
        if best.is_none_or(|(_, d)| diff < d) {
            best = Some((candidate, diff));
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
