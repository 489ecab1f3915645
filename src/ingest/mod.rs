/// Data acquisition from the public hydrology sources.
///
/// Submodules:
/// - `sites`: USGS site directory (RDB tab-delimited text) per region.
/// - `usgs`: USGS NWIS instantaneous values: URL construction + JSON parsing,
///   and the `SeriesSource` implementation used in production.
/// - `nwps`: NOAA NWPS gauge metadata and stage/flow forecast.
/// - `fixtures` (test only): representative API response payloads.
/// - `test_server` (test only): local HTTP server with canned statuses.
///
/// Every request goes through a client built by `build_client`, whose
/// timeout is the request deadline: when it expires the transfer is
/// aborted and the call fails with `GaugeError::Network`.

pub mod nwps;
pub mod sites;
pub mod usgs;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod test_server;

use reqwest::blocking::{Client, Response};
use std::time::Duration;

use crate::model::{GaugeError, Series, Unit};

/// Anything that can produce a recent series for a gauge.
///
/// Implemented by `usgs::UsgsClient`; evaluation code is written against
/// this trait so it can run over canned series.
pub trait SeriesSource {
    fn fetch_series(&self, gauge_id: &str, unit: Unit) -> Result<Series, GaugeError>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    fn fetch_series(&self, gauge_id: &str, unit: Unit) -> Result<Series, GaugeError> {
        (**self).fetch_series(gauge_id, unit)
    }
}

impl<S: SeriesSource + ?Sized> SeriesSource for std::sync::Arc<S> {
    fn fetch_series(&self, gauge_id: &str, unit: Unit) -> Result<Series, GaugeError> {
        (**self).fetch_series(gauge_id, unit)
    }
}

const USER_AGENT: &str = concat!("riverdash/", env!("CARGO_PKG_VERSION"));

/// Builds a blocking HTTP client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, GaugeError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(GaugeError::from)
}

/// Issues a GET and rejects any non-success status.
pub(crate) fn get_checked(client: &Client, url: &str) -> Result<Response, GaugeError> {
    log::debug!("GET {}", url);

    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(GaugeError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response)
}

/// GET returning the body as text.
pub(crate) fn get_text(client: &Client, url: &str) -> Result<String, GaugeError> {
    let body = get_checked(client, url)?.text()?;
    Ok(body)
}

/// Trims a trailing slash so endpoint roots compose with fixed paths.
pub(crate) fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
