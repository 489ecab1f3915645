//! riverdash: river gauge dashboard engine over the public USGS and NOAA feeds.
//!
//! # Module structure
//!
//! ```text
//! riverdash
//! ├── model       — shared data types (Series, GaugeSummary, Forecast, GaugeError, …)
//! ├── config      — settings loader (riverdash.toml + environment overrides)
//! ├── ingest
//! │   ├── sites   — USGS site directory per region (RDB text)
//! │   ├── usgs    — USGS NWIS IV API: URL construction + JSON parsing
//! │   ├── nwps    — NOAA NWPS forecast and gauge metadata
//! │   ├── fixtures (test only) — representative API response payloads
//! │   └── test_server (test only) — local HTTP server for client error paths
//! ├── analysis
//! │   ├── operators — scalar and timestamp-aligned series arithmetic
//! │   ├── derive    — level, hourly trend and freshness
//! │   └── custom    — plain and custom gauge evaluation
//! ├── store       — persisted gauge list and theme (dashboard.json)
//! ├── dashboard   — concurrent refresh of every configured gauge
//! └── display     — trend/level formatting rules
//! ```

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod ingest;
pub mod model;
pub mod store;
