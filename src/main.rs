//! riverdash - river gauge dashboard
//!
//! Looks up USGS gauges, shows their current level and hourly trend,
//! evaluates saved custom gauges and fetches NOAA flow forecasts.
//!
//! Usage:
//!   riverdash sites IL                 # list active stream gauges in Illinois
//!   riverdash gauge 05568500 --unit ft # current stage for one gauge
//!   riverdash add 05568500             # save a gauge to the dashboard
//!   riverdash refresh                  # evaluate every saved gauge
//!   riverdash edit 05568500 --max 9000 # change a saved gauge in place
//!
//! Environment:
//!   RIVERDASH_CONFIG - settings file (default riverdash.toml)
//!   USGS_BASE_URL / NWPS_BASE_URL - endpoint overrides
//!   RUST_LOG - log filter (default info)

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use riverdash::analysis::custom::evaluate_plain;
use riverdash::config::{Settings, load_settings};
use riverdash::dashboard::{GaugeRow, refresh_all, refresh_row};
use riverdash::display::{LevelStatus, format_level, format_trend, format_updated, level_cell};
use riverdash::ingest::build_client;
use riverdash::ingest::nwps::{ForecastClient, gauge_links, hydrograph_urls};
use riverdash::ingest::sites::list_gauges;
use riverdash::ingest::usgs::UsgsClient;
use riverdash::model::{GaugeError, Unit};
use riverdash::store::{CustomConfig, DashboardStore, GaugeConfig, GaugeEdit};

#[derive(Parser, Debug)]
#[command(author, version, about = "River gauge dashboard over the USGS and NOAA feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List active stream gauges in a state or region (e.g. IL)
    Sites { region: String },

    /// Show the current reading for one gauge
    Gauge {
        id: String,
        #[arg(long, default_value = "cfs")]
        unit: Unit,
    },

    /// Show the NOAA flow forecast for a gauge
    Forecast { id: String },

    /// Evaluate every saved gauge
    Refresh,

    /// Save a gauge to the dashboard
    Add {
        id: String,
        #[arg(long, default_value = "cfs")]
        unit: Unit,
        /// Display name (defaults to the site name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },

    /// Save a custom gauge from a JSON file holding its customConfig
    AddCustom {
        file: PathBuf,
        #[arg(long, default_value = "cfs")]
        unit: Unit,
        #[arg(long)]
        name: Option<String>,
    },

    /// Change a saved gauge's name, unit, range or custom chain
    Edit {
        id: String,
        /// New display name (empty clears it)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        unit: Option<Unit>,
        #[arg(long, conflicts_with = "clear_min")]
        min: Option<f64>,
        #[arg(long, conflicts_with = "clear_max")]
        max: Option<f64>,
        #[arg(long)]
        clear_min: bool,
        #[arg(long)]
        clear_max: bool,
        /// JSON file holding a replacement customConfig
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Remove a gauge from the dashboard
    Remove { id: String },

    /// Move a gauge to a 1-based position
    Move { id: String, position: usize },

    /// Toggle between the dark and light theme
    Theme,
}

/// Logger honouring `filters` (RUST_LOG syntax), `info` when unset.
fn logger_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(filters.filter(|f| !f.trim().is_empty()).unwrap_or("info"));
    builder
}

fn main() {
    logger_builder(std::env::var("RUST_LOG").ok().as_deref()).init();

    let cli = Cli::parse();

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &settings) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), GaugeError> {
    match command {
        Command::Sites { region } => {
            let client = build_client(settings.timeouts.lookup())?;
            let sites = list_gauges(&client, &settings.sources.usgs_base_url, &region)?;
            println!("📍 {} gauges in {}\n", sites.len(), region.to_uppercase());
            for site in &sites {
                println!("   {:<16} {}", site.id, site.name);
            }
        }

        Command::Gauge { id, unit } => {
            let usgs = UsgsClient::from_settings(settings)?;
            let reading = evaluate_plain(&usgs, &id, unit)?;
            println!("🌊 {} ({})", reading.site_name, reading.gauge_id);
            println!("   Level:   {}", level_cell(&reading.summary, unit));
            println!("   Trend:   {}", format_trend(reading.summary.trend, unit));
            println!("   Updated: {}", format_updated(reading.summary.updated));
        }

        Command::Forecast { id } => {
            if id.starts_with("custom-") {
                return Err(GaugeError::Config(
                    "forecasts are not available for custom gauges".to_string(),
                ));
            }
            let forecast = ForecastClient::from_settings(settings)?.fetch_forecast(&id)?;

            println!("📈 Forecast for {}\n", id);
            if forecast.daily.is_empty() {
                println!("   No forecast published");
            }
            for day in &forecast.daily {
                println!(
                    "   {}  high {:>12}  low {:>12}",
                    day.date,
                    format_level(Some(day.high), Unit::Flow),
                    format_level(Some(day.low), Unit::Flow)
                );
            }

            let lid = Some(forecast.lid.as_str()).filter(|l| !l.is_empty());
            if let Some(lid) = lid {
                let (primary, fallback) = hydrograph_urls(lid, Utc::now());
                println!("\n   Hydrograph: {}", primary);
                println!("   Fallback:   {}", fallback);
            }
            for link in gauge_links(&id, lid) {
                println!("   🔗 {}", link);
            }
        }

        Command::Refresh => {
            let dashboard = DashboardStore::new(&settings.dashboard.path).load()?;
            if dashboard.unreadable_count() > 0 {
                println!(
                    "⚠️  {} saved gauge(s) could not be read and are skipped",
                    dashboard.unreadable_count()
                );
            }
            if dashboard.gauges.is_empty() {
                println!("No gauges saved yet. Add one with `riverdash add <ID>`.");
                return Ok(());
            }

            let source = Arc::new(UsgsClient::from_settings(settings)?);
            let rows = refresh_all(source, &dashboard.gauges, settings.dashboard.workers);
            for row in &rows {
                print_row(row);
            }
        }

        Command::Add { id, unit, name, min, max } => {
            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;

            let site_name = match UsgsClient::from_settings(settings)
                .and_then(|usgs| usgs.fetch_series(&id, unit))
            {
                Ok(series) => Some(series.display_name),
                Err(e) => {
                    log::warn!("could not look up site name for {}: {}", id, e);
                    None
                }
            };

            let mut gauge = GaugeConfig::plain(&id, site_name.as_deref(), unit).with_range(min, max);
            if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                gauge.display_name = Some(name);
            }
            let label = gauge.label().to_string();

            dashboard.add(gauge)?;
            store.save(&dashboard)?;
            println!("✓ Added {} ({})", label, id);
        }

        Command::AddCustom { file, unit, name } => {
            let config = read_custom_config(&file)?;
            if let Err(e) = config.validate() {
                println!("⚠️  {} (the gauge will show no reading until this step is fixed)", e);
            }

            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;
            let gauge = GaugeConfig::custom(config, unit, name.as_deref(), Utc::now());
            let (id, label) = (gauge.id.clone(), gauge.label().to_string());

            dashboard.add(gauge)?;
            store.save(&dashboard)?;
            println!("✓ Added custom gauge {} ({})", label, id);
        }

        Command::Edit { id, name, unit, min, max, clear_min, clear_max, config } => {
            let custom_config = match config {
                Some(file) => {
                    let config = read_custom_config(&file)?;
                    if let Err(e) = config.validate() {
                        println!("⚠️  {} (the gauge will show no reading until this step is fixed)", e);
                    }
                    Some(config)
                }
                None => None,
            };
            let edit = GaugeEdit {
                display_name: name,
                unit,
                min_flow: if clear_min { Some(None) } else { min.map(Some) },
                max_flow: if clear_max { Some(None) } else { max.map(Some) },
                custom_config,
            };

            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;
            let refetch = dashboard.update(&id, edit)?;
            store.save(&dashboard)?;

            let Some(gauge) = dashboard.find(&id) else {
                return Ok(());
            };
            println!("✓ Updated {} ({})", gauge.label(), id);
            if refetch {
                let usgs = UsgsClient::from_settings(settings)?;
                print_row(&refresh_row(&usgs, gauge));
            }
        }

        Command::Remove { id } => {
            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;
            if !dashboard.remove(&id) {
                return Err(GaugeError::Config(format!("no gauge {} on the dashboard", id)));
            }
            store.save(&dashboard)?;
            println!("✓ Removed {}", id);
        }

        Command::Move { id, position } => {
            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;
            if !dashboard.move_to(&id, position.saturating_sub(1)) {
                return Err(GaugeError::Config(format!("no gauge {} on the dashboard", id)));
            }
            store.save(&dashboard)?;
            println!("✓ Moved {} to position {}", id, position.max(1));
        }

        Command::Theme => {
            let store = DashboardStore::new(&settings.dashboard.path);
            let mut dashboard = store.load()?;
            let theme = dashboard.toggle_theme();
            store.save(&dashboard)?;
            println!("✓ Theme set to {:?}", theme);
        }
    }

    Ok(())
}

fn read_custom_config(file: &Path) -> Result<CustomConfig, GaugeError> {
    let contents = fs::read_to_string(file)?;
    serde_json::from_str(&contents)
        .map_err(|e| GaugeError::Parse(format!("{}: {}", file.display(), e)))
}

fn print_row(row: &GaugeRow) {
    let unit = row.config.unit;
    let marker = match row.status() {
        LevelStatus::OutOfRange => "⚠️ ",
        LevelStatus::InRange => "✓ ",
        LevelStatus::Unbounded | LevelStatus::Unknown => "  ",
    };
    let suffix = if row.available { "" } else { "  (unavailable)" };

    println!(
        "{}{:<40} {:>26} {:>16} {:>10}{}",
        marker,
        row.title(),
        level_cell(&row.summary, unit),
        format_trend(row.summary.trend, unit),
        format_updated(row.summary.updated),
        suffix
    );
}
