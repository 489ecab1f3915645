/// Test fixtures: representative payloads from the USGS and NOAA APIs.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parsers.
///
/// USGS IV response shape:
///   response.value.timeSeries[0]
///     .sourceInfo.siteName
///     .variable.noDataValue         : sentinel for missing data (-999999)
///     .values[0].value[]
///       .value     : the measurement as a STRING (not a number)
///       .dateTime  : ISO 8601 with offset
///       .qualifiers: e.g. ["P"], ["A"], ["P", "Ice"]
///
/// NWPS stageflow shape:
///   response.forecast.data[]
///     .validTime : ISO 8601 UTC
///     .primary   : stage, ft
///     .secondary : flow, kcfs (thousands of cfs)

/// Kingston Mines (05568500) discharge, five readings 15 minutes apart,
/// rising 42000 → 42300 cfs.
pub(crate) fn fixture_kingston_mines_series_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "Illinois River at Kingston Mines, IL",
              "siteCode": [{ "value": "05568500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00060", "network": "NWIS" }],
              "variableName": "Streamflow, ft&#179;/s",
              "unit": { "unitCode": "ft3/s" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "42000", "qualifiers": ["P"], "dateTime": "2024-05-01T12:00:00.000-05:00" },
                { "value": "42100", "qualifiers": ["P"], "dateTime": "2024-05-01T12:15:00.000-05:00" },
                { "value": "42200", "qualifiers": ["P"], "dateTime": "2024-05-01T12:30:00.000-05:00" },
                { "value": "42250", "qualifiers": ["P"], "dateTime": "2024-05-01T12:45:00.000-05:00" },
                { "value": "42300", "qualifiers": ["P"], "dateTime": "2024-05-01T13:00:00.000-05:00" }
              ],
              "qualifier": [{ "qualifierCode": "P", "qualifierDescription": "Provisional data subject to revision." }]
            }]
          }
        ]
      }
    }"#
}

/// Winter stage series: the only ice-qualified entry is a sentinel that
/// gets filtered out, plus one non-numeric entry. Two usable readings remain.
pub(crate) fn fixture_ice_affected_series_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "Fox River at Dayton, IL",
              "siteCode": [{ "value": "05552500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "-999999", "qualifiers": ["P", "Ice"], "dateTime": "2024-01-15T08:00:00.000-06:00" },
                { "value": "Eqp", "qualifiers": ["P"], "dateTime": "2024-01-15T08:15:00.000-06:00" },
                { "value": "4.51", "qualifiers": ["P", "e"], "dateTime": "2024-01-15T08:30:00.000-06:00" },
                { "value": "4.49", "qualifiers": ["P", "e"], "dateTime": "2024-01-15T08:45:00.000-06:00" }
              ]
            }]
          }
        ]
      }
    }"#
}

/// Readings delivered out of order and without a siteName.
pub(crate) fn fixture_unordered_series_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {},
            "variable": { "noDataValue": -999999.0 },
            "values": [{
              "value": [
                { "value": "3.0", "qualifiers": [], "dateTime": "2024-05-01T14:00:00Z" },
                { "value": "1.0", "qualifiers": [], "dateTime": "2024-05-01T12:00:00Z" },
                { "value": "2.0", "qualifiers": [], "dateTime": "2024-05-01T13:00:00Z" }
              ]
            }]
          }
        ]
      }
    }"#
}

/// Valid envelope with no time series (unknown or inactive site).
pub(crate) fn fixture_empty_time_series_json() -> &'static str {
    r#"{ "name": "ns1:timeSeriesResponseType", "value": { "queryInfo": {}, "timeSeries": [] } }"#
}

/// RDB site listing: comment block, header, format row, three sites
/// (one with a blank station name) and a trailing blank line.
pub(crate) fn fixture_illinois_sites_rdb() -> &'static str {
    "#\n\
     # US Geological Survey\n\
     # retrieved: 2024-05-01 12:00:00 -04:00\t(caas01)\n\
     #\n\
     agency_cd\tsite_no\tstation_nm\tsite_tp_cd\tdec_lat_va\tdec_long_va\n\
     5s\t15s\t50s\t7s\t16s\t16s\n\
     USGS\t05568500\tILLINOIS RIVER AT KINGSTON MINES, IL\tST\t40.5561\t-89.7776\n\
     USGS\t05567500\t\tST\t40.6939\t-89.5898\n\
     USGS\t05568000\tILLINOIS RIVER AT CHILLICOTHE, IL\tST\t40.9200\t-89.4854\n\
     \n"
}

/// NWPS gauge metadata for Kingston Mines (lid KNGI2).
pub(crate) fn fixture_nwps_gauge_json() -> &'static str {
    r#"{
      "lid": "KNGI2",
      "usgsId": "05568500",
      "name": "Illinois River at Kingston Mines",
      "images": {
        "hydrograph": {
          "default": "https://water.noaa.gov/resources/hydrographs/kngi2_hg.png",
          "floodcat": "https://water.noaa.gov/resources/hydrographs/kngi2_hg_floodcat.png"
        }
      }
    }"#
}

/// NWPS stageflow forecast spanning six UTC days; two points on the first
/// day, a null flow on the third.
pub(crate) fn fixture_nwps_stageflow_json() -> &'static str {
    r#"{
      "observed": { "data": [] },
      "forecast": {
        "primaryUnits": "ft",
        "secondaryUnits": "kcfs",
        "data": [
          { "validTime": "2024-05-01T12:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 18.4, "secondary": 1.2 },
          { "validTime": "2024-05-01T18:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 18.2, "secondary": 0.8 },
          { "validTime": "2024-05-02T06:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 18.0, "secondary": 40.5 },
          { "validTime": "2024-05-03T06:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 17.6, "secondary": null },
          { "validTime": "2024-05-04T06:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 17.1, "secondary": 38.0 },
          { "validTime": "2024-05-05T06:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 16.8, "secondary": 36.5 },
          { "validTime": "2024-05-06T06:00:00Z", "generatedTime": "2024-05-01T10:00:00Z", "primary": 16.2, "secondary": 35.0 }
        ]
      }
    }"#
}
