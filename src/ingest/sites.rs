/// USGS site directory client.
///
/// Lists the active stream gauges with instantaneous values in a region
/// (state code), using the Site Service RDB output:
///   https://waterservices.usgs.gov/nwis/site/
///
/// RDB is tab-delimited text: `#` comment lines, one header row naming the
/// columns, one column-format row (e.g. `5s\t15s`), then data rows.

use reqwest::blocking::Client;

use crate::ingest::{get_text, trim_base};
use crate::model::{GaugeError, SiteEntry};

const COMMENT_MARKER: char = '#';
const SITE_ID_COLUMN: &str = "site_no";
const SITE_NAME_COLUMN: &str = "station_nm";

/// Builds the site directory URL for a region code.
pub fn build_sites_url(base_url: &str, region_code: &str) -> String {
    format!(
        "{}/site/?format=rdb&stateCd={}&siteType=ST&siteStatus=active&hasDataTypeCd=iv",
        trim_base(base_url),
        urlencoding::encode(region_code)
    )
}

/// Fetches and parses the gauge directory for `region_code`.
///
/// # Errors
/// - `GaugeError::HttpStatus` / `GaugeError::Network`: non-success status,
///   transport failure or deadline exceeded.
pub fn list_gauges(
    client: &Client,
    base_url: &str,
    region_code: &str,
) -> Result<Vec<SiteEntry>, GaugeError> {
    let url = build_sites_url(base_url, region_code);
    let body = get_text(client, &url)?;
    let sites = parse_sites(&body);
    log::debug!("{} gauges listed for region {}", sites.len(), region_code);
    Ok(sites)
}

/// Parses an RDB site listing into `SiteEntry`s.
///
/// Never fails: a body with no header row, or a header without a
/// `site_no` column, yields an empty list. Rows without an identifier are
/// dropped; a missing name falls back to the identifier.
pub fn parse_sites(rdb: &str) -> Vec<SiteEntry> {
    let lines: Vec<&str> = rdb.lines().collect();

    let header_index = lines.iter().position(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with(COMMENT_MARKER)
    });

    let Some(header_index) = header_index else {
        return Vec::new();
    };

    let headers: Vec<&str> = lines[header_index].split('\t').map(str::trim).collect();
    let Some(id_col) = headers.iter().position(|h| *h == SITE_ID_COLUMN) else {
        return Vec::new();
    };
    let name_col = headers.iter().position(|h| *h == SITE_NAME_COLUMN);

    // Skip the header and the column-format row that follows it
    lines
        .iter()
        .skip(header_index + 2)
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            let id = fields.get(id_col).map(|f| f.trim()).filter(|f| !f.is_empty())?;
            let name = name_col
                .and_then(|col| fields.get(col))
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .unwrap_or(id);

            Some(SiteEntry {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
