/// Time-series derivation for the river gauge dashboard.
///
/// Submodules:
/// - `operators`: scalar arithmetic and timestamp-aligned combination of series.
/// - `derive`   : level, hourly trend and freshness from a single series.
/// - `custom`   : plain and custom gauge evaluation (fetch + fold + derive).

pub mod custom;
pub mod derive;
pub mod operators;
