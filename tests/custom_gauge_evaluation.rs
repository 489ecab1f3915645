/// Integration tests for custom gauge evaluation
///
/// These tests verify, over canned series and without network access:
/// 1. Fetched IV payloads flow through parse → combine → derive
/// 2. An unparseable scalar abandons the chain before later fetches
/// 3. `updated` reports the least fresh input
/// 4. Saved custom configs evaluate the same as hand-built expressions
///
/// Run with: cargo test --test custom_gauge_evaluation

use riverdash::analysis::custom::evaluate_custom;
use riverdash::analysis::derive::derive;
use riverdash::ingest::SeriesSource;
use riverdash::ingest::usgs::parse_iv_response;
use riverdash::model::{
    CustomGaugeExpression, GaugeError, Operand, Operator, OperatorStep, Series, TimeSeriesPoint,
    Unit,
};
use riverdash::store::{CustomConfig, CustomOperation};

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves series by gauge id and records the order of requests.
#[derive(Default)]
struct CannedSource {
    series: HashMap<String, Series>,
    requests: Mutex<Vec<String>>,
}

impl CannedSource {
    fn insert(&mut self, series: Series) {
        self.series.insert(series.gauge_id.clone(), series);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl SeriesSource for CannedSource {
    fn fetch_series(&self, gauge_id: &str, _unit: Unit) -> Result<Series, GaugeError> {
        self.requests.lock().unwrap().push(gauge_id.to_string());
        self.series
            .get(gauge_id)
            .cloned()
            .ok_or_else(|| GaugeError::HttpStatus { status: 404, url: gauge_id.to_string() })
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

fn series(id: &str, points: &[(i64, f64)]) -> Series {
    let mut s = Series::empty(id, Unit::Flow);
    s.points = points
        .iter()
        .map(|&(min, v)| TimeSeriesPoint::new(t0() + Duration::minutes(min), v))
        .collect();
    s
}

/// Minimal IV payload with readings at 15-minute steps from `t0`.
fn iv_payload(site: &str, name: &str, values: &[&str]) -> String {
    let entries: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let ts = (t0() + Duration::minutes(15 * i as i64)).to_rfc3339();
            format!(r#"{{ "value": "{}", "qualifiers": ["P"], "dateTime": "{}" }}"#, v, ts)
        })
        .collect();

    format!(
        r#"{{ "value": {{ "timeSeries": [{{
            "sourceInfo": {{ "siteName": "{name}", "siteCode": [{{ "value": "{site}" }}] }},
            "variable": {{ "noDataValue": -999999.0 }},
            "values": [{{ "value": [{entries}] }}]
        }}] }} }}"#,
        name = name,
        site = site,
        entries = entries.join(",")
    )
}

fn step(operator: Operator, operand: Operand) -> OperatorStep {
    OperatorStep { operator, operand }
}

#[test]
fn test_parsed_series_combine_and_derive() {
    let mut source = CannedSource::default();
    source.insert(
        parse_iv_response(
            "05586100",
            Unit::Flow,
            &iv_payload("05586100", "ILLINOIS RIVER AT VALLEY CITY, IL", &["1000", "1100", "1200", "1300", "1400"]),
        )
        .expect("payload should parse"),
    );
    source.insert(
        parse_iv_response(
            "05587450",
            Unit::Flow,
            &iv_payload("05587450", "MISSISSIPPI RIVER AT GRAFTON, IL", &["50", "50", "-999999", "50", "50"]),
        )
        .expect("payload should parse"),
    );

    let expr = CustomGaugeExpression {
        base_gauge_id: "05586100".into(),
        steps: vec![
            step(Operator::Sub, Operand::Gauge("05587450".into())),
            step(Operator::Mul, Operand::Scalar(2.0)),
        ],
    };

    let summary = evaluate_custom(&source, &expr, Unit::Flow).expect("evaluation should succeed");

    // The sentinel drops the 12:30 operand reading; its neighbours are
    // 15 minutes away, outside the tolerance, so 12:30 is dropped too.
    assert_eq!(summary.level, Some((1400.0 - 50.0) * 2.0));
    assert_eq!(summary.trend, Some(800.0));
    assert_eq!(summary.updated, Some(t0() + Duration::minutes(60)));
    assert!(!summary.frozen);
}

#[test]
fn test_unparseable_scalar_is_all_absent_and_stops_fetching() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 5.0), (60, 6.0)]));
    source.insert(series("B", &[(0, 1.0), (60, 1.0)]));

    let expr = CustomGaugeExpression {
        base_gauge_id: "A".into(),
        steps: vec![
            step(Operator::Add, Operand::parse_scalar("abc")),
            step(Operator::Add, Operand::Gauge("B".into())),
        ],
    };

    let summary = evaluate_custom(&source, &expr, Unit::Flow).unwrap();
    assert!(summary.is_absent(), "unparseable operand should blank every field");
    assert_eq!(source.requests(), vec!["A".to_string()]);
}

#[test]
fn test_updated_reports_oldest_operand() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 10.0), (60, 20.0), (120, 30.0)]));
    source.insert(series("B", &[(0, 1.0), (58, 2.0)]));

    let expr = CustomGaugeExpression {
        base_gauge_id: "A".into(),
        steps: vec![step(Operator::Add, Operand::Gauge("B".into()))],
    };

    let summary = evaluate_custom(&source, &expr, Unit::Flow).unwrap();
    // 120 has no partner within tolerance; the last combined point is 60,
    // but B last reported at 58
    assert_eq!(summary.level, Some(22.0));
    assert_eq!(summary.updated, Some(t0() + Duration::minutes(58)));
}

#[test]
fn test_division_by_zero_operand_reports_no_level() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 10.0), (60, 20.0)]));
    source.insert(series("ZERO", &[(0, 2.0), (60, 0.0)]));

    let expr = CustomGaugeExpression {
        base_gauge_id: "A".into(),
        steps: vec![step(Operator::Div, Operand::Gauge("ZERO".into()))],
    };

    let summary = evaluate_custom(&source, &expr, Unit::Flow).unwrap();
    assert_eq!(summary.level, None);
    assert_eq!(summary.trend, None);
    assert_eq!(summary.updated, Some(t0() + Duration::minutes(60)));
}

#[test]
fn test_operand_fetch_failure_propagates() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 10.0)]));

    let expr = CustomGaugeExpression {
        base_gauge_id: "A".into(),
        steps: vec![step(Operator::Add, Operand::Gauge("OFFLINE".into()))],
    };

    let result = evaluate_custom(&source, &expr, Unit::Flow);
    assert!(matches!(result, Err(GaugeError::HttpStatus { status: 404, .. })));
}

#[test]
fn test_saved_config_matches_hand_built_expression() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 100.0), (60, 110.0), (120, 120.0)]));

    let saved: CustomConfig = serde_json::from_str(
        r#"{
            "baseGauge": "A",
            "baseGaugeName": "River A",
            "operations": [
                { "operator": "*", "operandType": "number", "operandValue": "0.5" },
                { "operator": "+", "operandType": "number", "operandValue": 10 }
            ]
        }"#,
    )
    .expect("saved config should parse");

    let from_saved = evaluate_custom(&source, &saved.to_expression(), Unit::Flow).unwrap();
    let by_hand = evaluate_custom(
        &source,
        &CustomGaugeExpression {
            base_gauge_id: "A".into(),
            steps: vec![
                step(Operator::Mul, Operand::Scalar(0.5)),
                step(Operator::Add, Operand::Scalar(10.0)),
            ],
        },
        Unit::Flow,
    )
    .unwrap();

    assert_eq!(from_saved, by_hand);
    assert_eq!(from_saved.level, Some(70.0));
    assert_eq!(from_saved.trend, Some(5.0));
    assert_eq!(saved.auto_name(), "River A * 0.5 + 10");
}

#[test]
fn test_no_steps_matches_plain_derivation() {
    let base = series("A", &[(0, 100.0), (60, 110.0), (120, 120.0)]);
    let mut source = CannedSource::default();
    source.insert(base.clone());

    let expr = CustomGaugeExpression { base_gauge_id: "A".into(), steps: Vec::new() };
    assert_eq!(evaluate_custom(&source, &expr, Unit::Flow).unwrap(), derive(&base));
}

#[test]
fn test_gauge_step_with_no_gauge_selected_is_absent() {
    let mut source = CannedSource::default();
    source.insert(series("A", &[(0, 1.0)]));

    let config = CustomConfig {
        base_gauge: "A".into(),
        base_gauge_name: None,
        operations: vec![CustomOperation {
            gauge: None,
            ..CustomOperation::gauge(Operator::Add, "", None)
        }],
    };

    let summary = evaluate_custom(&source, &config.to_expression(), Unit::Flow).unwrap();
    assert!(summary.is_absent());
}
