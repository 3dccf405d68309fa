use latmon_common::{MetricsReport, MetricsRequest, RegionStats};

fn sample_stats(avg: f64) -> RegionStats {
    RegionStats { avg_latency: avg, p95_latency: avg + 10.0, avg_uptime: 99.5, breaches: 2 }
}

#[test]
fn test_request_roundtrip_json() {
    let original = MetricsRequest {
        regions: vec!["apac".to_string(), "emea".to_string()],
        threshold_ms: 180,
    };
    let json = serde_json::to_string(&original).unwrap();
    let decoded: MetricsRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn test_request_wire_shape() {
    let json = r#"{"regions":["apac"],"threshold_ms":200}"#;
    let parsed: MetricsRequest = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.regions, vec!["apac"]);
    assert_eq!(parsed.threshold_ms, 200);
}

#[test]
fn test_report_preserves_request_order() {
    let mut report = MetricsReport::new();
    report.insert("emea", Some(sample_stats(160.0)));
    report.insert("apac", Some(sample_stats(180.0)));
    report.insert("amer", None);

    let order: Vec<&str> = report.iter().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["emea", "apac", "amer"]);

    let json = serde_json::to_string(&report).unwrap();
    let emea = json.find("emea").unwrap();
    let apac = json.find("apac").unwrap();
    let amer = json.find("amer").unwrap();
    assert!(emea < apac && apac < amer);
}

#[test]
fn test_report_absent_region_serializes_as_null() {
    let mut report = MetricsReport::new();
    report.insert("unknown", None);
    assert_eq!(serde_json::to_string(&report).unwrap(), r#"{"unknown":null}"#);
}

#[test]
fn test_report_duplicate_insert_collapses() {
    let mut report = MetricsReport::new();
    report.insert("apac", None);
    report.insert("emea", Some(sample_stats(160.0)));
    report.insert("apac", Some(sample_stats(180.0)));

    assert_eq!(report.len(), 2);
    // The duplicate keeps its original position but takes the new value.
    let order: Vec<&str> = report.iter().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["apac", "emea"]);
    assert_eq!(report.get("apac").unwrap().unwrap().avg_latency, 180.0);
}

#[test]
fn test_report_roundtrip_json() {
    let mut original = MetricsReport::new();
    original.insert("apac", Some(sample_stats(183.33)));
    original.insert("amer", None);

    let json = serde_json::to_string(&original).unwrap();
    let decoded: MetricsReport = serde_json::from_str(&json).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn test_report_get_distinguishes_missing_from_absent() {
    let mut report = MetricsReport::new();
    report.insert("apac", None);

    assert_eq!(report.get("apac"), Some(&None));
    assert_eq!(report.get("emea"), None);
}

#[test]
fn test_region_stats_wire_shape() {
    let stats = RegionStats { avg_latency: 183.33, p95_latency: 198.0, avg_uptime: 66.67, breaches: 2 };
    let json = serde_json::to_string(&stats).unwrap();
    assert_eq!(
        json,
        r#"{"avg_latency":183.33,"p95_latency":198.0,"avg_uptime":66.67,"breaches":2}"#
    );
}
