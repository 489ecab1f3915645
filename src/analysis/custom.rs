/// Custom gauge evaluation.
///
/// A custom gauge is a base gauge followed by a flat chain of operator
/// steps, folded left to right. Scalar steps map every value; gauge steps
/// fetch the operand gauge and combine it by timestamp alignment. The
/// result runs through the same derivation as a plain gauge, except that
/// `updated` reports the least fresh input rather than the last combined
/// point.

use chrono::{DateTime, Utc};

use crate::analysis::derive::derive;
use crate::analysis::operators::{align_and_combine, apply_scalar};
use crate::ingest::SeriesSource;
use crate::model::{CustomGaugeExpression, GaugeError, GaugeReading, GaugeSummary, Operand, Unit};

/// Evaluates a plain gauge: fetch, then derive.
pub fn evaluate_plain<S>(source: &S, gauge_id: &str, unit: Unit) -> Result<GaugeReading, GaugeError>
where
    S: SeriesSource + ?Sized,
{
    let series = source.fetch_series(gauge_id, unit)?;
    Ok(GaugeReading {
        gauge_id: series.gauge_id.clone(),
        site_name: series.display_name.clone(),
        unit,
        summary: derive(&series),
    })
}

/// Evaluates a custom gauge expression in `unit`.
///
/// Folding stops as soon as the running series is empty, and an
/// unparseable scalar operand abandons the evaluation; both yield an
/// all-absent summary. Fetches happen in step order, so a gauge operand
/// after either of those is never requested.
///
/// # Errors
/// Fetch failures for the base gauge or any gauge operand reached by the
/// fold are returned unchanged.
pub fn evaluate_custom<S>(
    source: &S,
    expression: &CustomGaugeExpression,
    unit: Unit,
) -> Result<GaugeSummary, GaugeError>
where
    S: SeriesSource + ?Sized,
{
    let mut current = source.fetch_series(&expression.base_gauge_id, unit)?;
    let mut oldest_updated = current.latest_timestamp();

    for (index, step) in expression.steps.iter().enumerate() {
        if current.is_empty() {
            break;
        }

        match &step.operand {
            Operand::Scalar(value) => {
                current = apply_scalar(&current, step.operator, *value);
            }
            Operand::Unparsed(text) => {
                log::warn!(
                    "custom gauge on {}: step {} operand {:?} is not a number",
                    expression.base_gauge_id,
                    index + 1,
                    text
                );
                return Ok(GaugeSummary::absent());
            }
            Operand::Gauge(gauge_id) => {
                let operand = source.fetch_series(gauge_id, unit)?;
                current = align_and_combine(&current, &operand, step.operator);
                oldest_updated = older_of(oldest_updated, operand.latest_timestamp());
            }
        }
    }

    if current.is_empty() {
        return Ok(GaugeSummary::absent());
    }

    let derived = derive(&current);
    Ok(GaugeSummary {
        updated: oldest_updated.or(derived.updated),
        ..derived
    })
}

fn older_of(
    current: Option<DateTime<Utc>>,
    candidate: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (current, candidate) {
        (Some(c), Some(n)) if n < c => Some(n),
        _ => current,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
