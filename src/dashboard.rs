/// Dashboard refresh: evaluates every configured gauge into a display row.
///
/// Rows are evaluated on a fixed-size `threadpool::ThreadPool` and returned
/// in dashboard order. A gauge whose fetch fails becomes an unavailable row
/// with an all-absent summary; it never takes down the rest of the refresh.

use std::sync::Arc;
use std::sync::mpsc;
use threadpool::ThreadPool;

use crate::analysis::custom::{evaluate_custom, evaluate_plain};
use crate::display::{LevelStatus, level_status};
use crate::ingest::SeriesSource;
use crate::model::{GaugeError, GaugeSummary};
use crate::store::GaugeConfig;

/// One rendered line of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeRow {
    pub config: GaugeConfig,
    /// Site name from the source for plain gauges, the saved label otherwise.
    pub site_name: String,
    pub summary: GaugeSummary,
    /// False when evaluation failed and `summary` is a placeholder.
    pub available: bool,
}

impl GaugeRow {
    fn unavailable(config: &GaugeConfig) -> Self {
        Self {
            site_name: config.label().to_string(),
            config: config.clone(),
            summary: GaugeSummary::absent(),
            available: false,
        }
    }

    /// Name to show: the user's display name wins over the source's.
    pub fn title(&self) -> &str {
        self.config
            .display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.site_name)
    }

    pub fn status(&self) -> LevelStatus {
        level_status(self.summary.level, self.config.min_flow, self.config.max_flow)
    }
}

/// Evaluates one configured gauge.
///
/// # Errors
/// Any fetch error from the gauges it reads, or `GaugeError::Config` for a
/// custom gauge saved without its operator chain.
pub fn evaluate<S>(source: &S, config: &GaugeConfig) -> Result<GaugeRow, GaugeError>
where
    S: SeriesSource + ?Sized,
{
    if config.is_custom {
        let expression = config.expression().ok_or_else(|| {
            GaugeError::Config(format!("custom gauge {} has no customConfig", config.id))
        })?;
        let summary = evaluate_custom(source, &expression, config.unit)?;
        return Ok(GaugeRow {
            config: config.clone(),
            site_name: config.label().to_string(),
            summary,
            available: true,
        });
    }

    let reading = evaluate_plain(source, &config.id, config.unit)?;
    Ok(GaugeRow {
        config: config.clone(),
        site_name: reading.site_name,
        summary: reading.summary,
        available: true,
    })
}

/// `evaluate`, with failures logged and turned into an unavailable row.
pub fn refresh_row<S>(source: &S, config: &GaugeConfig) -> GaugeRow
where
    S: SeriesSource + ?Sized,
{
    match evaluate(source, config) {
        Ok(row) => row,
        Err(e) => {
            log::warn!("gauge {} unavailable: {}", config.id, e);
            GaugeRow::unavailable(config)
        }
    }
}

/// Refreshes every gauge using up to `workers` threads.
///
/// The result has one row per config, in the same order.
pub fn refresh_all<S>(source: Arc<S>, configs: &[GaugeConfig], workers: usize) -> Vec<GaugeRow>
where
    S: SeriesSource + Send + Sync + 'static + ?Sized,
{
    if configs.is_empty() {
        return Vec::new();
    }

    let pool = ThreadPool::new(workers.clamp(1, configs.len()));
    let (tx, rx) = mpsc::channel();

    for (index, config) in configs.iter().cloned().enumerate() {
        let tx = tx.clone();
        let source = Arc::clone(&source);
        pool.execute(move || {
            let row = refresh_row(source.as_ref(), &config);
            // Receiver only goes away once every row is in
            let _ = tx.send((index, row));
        });
    }
    drop(tx);

    let mut rows: Vec<Option<GaugeRow>> = vec![None; configs.len()];
    for (index, row) in rx.iter() {
        rows[index] = Some(row);
    }

    log::info!("refreshed {} gauges on {} workers", configs.len(), pool.max_count());

    // A worker that panicked never reported; show its gauge as unavailable
    rows.into_iter()
        .zip(configs)
        .map(|(row, config)| row.unwrap_or_else(|| GaugeRow::unavailable(config)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
