//! End-to-end tests: feed directories on disk through the public API.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use serde_json::json;
use tempfile::TempDir;

use feedcheck::notice::NoticeContainer;
use feedcheck::rules::{RUNTIME_EXCEPTION_CODE, default_rules};
use feedcheck::schema::gtfs;
use feedcheck::{
    Feed, FeedCheck, FeedCheckConfig, FeedCheckError, Rule, RuleError, Severity,
};

const AGENCY: &str = "agency_id,agency_name,agency_url,agency_timezone\n\
                      MT,Metro,https://metro.example,Europe/Paris\n";
const STOPS: &str = "stop_id,stop_name,stop_lat,stop_lon\n\
                     A,Alpha,48.8500,2.3500\n\
                     B,Beta,48.8600,2.3600\n\
                     C,Gamma,48.8700,2.3700\n";
const ROUTES: &str = "route_id,agency_id,route_type\n\
                      R1,MT,3\n";
const TRIPS: &str = "route_id,service_id,trip_id\n\
                     R1,WK,T1\n\
                     R1,WK,T2\n";
const STOP_TIMES: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                          T1,08:00:00,08:00:00,A,1\n\
                          T1,08:05:00,08:05:00,B,2\n\
                          T1,08:10:00,08:10:00,C,3\n\
                          T2,09:00:00,09:00:00,C,1\n\
                          T2,09:05:00,09:05:00,B,2\n";
const CALENDAR: &str = "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                        WK,1,1,1,1,1,0,0,20240101,20241231\n";

/// Helper to write a feed directory from (filename, content) pairs.
fn write_feed(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("Failed to write feed file");
    }
    dir
}

fn valid_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("agency.txt", AGENCY),
        ("stops.txt", STOPS),
        ("routes.txt", ROUTES),
        ("trips.txt", TRIPS),
        ("stop_times.txt", STOP_TIMES),
        ("calendar.txt", CALENDAR),
    ]
}

/// Valid feed with one file replaced or added.
fn feed_with(name: &'static str, content: &'static str) -> TempDir {
    let mut files = valid_files();
    files.retain(|(n, _)| *n != name);
    files.push((name, content));
    write_feed(&files)
}

fn validate(dir: &Path) -> feedcheck::ValidationResult {
    FeedCheck::new().validate_dir(dir).expect("Validation failed")
}

// =============================================================================
// Whole-feed Tests
// =============================================================================

#[test]
fn test_valid_feed_has_no_notices() {
    let dir = write_feed(&valid_files());
    let result = validate(dir.path());

    assert_eq!(result.report.total(), 0, "{:?}", result.report.notices);
    assert_eq!(result.summary.tables_loaded, 6);
    assert_eq!(result.summary.recommendation, "Feed is valid.");
    assert!(result.summary.rules_failed.is_empty());
    assert!(!result.cancelled);

    assert_eq!(result.sources.len(), 6);
    let stops = result.sources.iter().find(|s| s.file == "stops.txt").unwrap();
    assert_eq!(stops.row_count, 3);
    assert!(stops.hash.starts_with("sha256:"));
    assert!(stops.path.is_some());
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        FeedCheck::new().validate_dir(&missing),
        Err(FeedCheckError::Io { .. })
    ));
}

#[test]
fn test_directory_without_feed_files_is_an_error() {
    let dir = write_feed(&[("README.md", "not a feed")]);
    assert!(matches!(
        FeedCheck::new().validate_dir(dir.path()),
        Err(FeedCheckError::EmptyData(_))
    ));
}

#[test]
fn test_missing_required_files() {
    let dir = write_feed(&[("agency.txt", AGENCY), ("calendar.txt", CALENDAR)]);
    let result = validate(dir.path());

    assert_eq!(result.report.count("missing_required_file"), 4);
    let missing: Vec<_> = result
        .report
        .with_code("missing_required_file")
        .filter_map(|n| n.field("filename"))
        .cloned()
        .collect();
    assert_eq!(
        missing,
        vec![json!("stops.txt"), json!("routes.txt"), json!("trips.txt"), json!("stop_times.txt")]
    );
    assert!(result.report.has_errors());
    assert!(!result.summary.rules_skipped.is_empty());
}

#[test]
fn test_byte_order_mark_is_ignored() {
    let dir = feed_with(
        "routes.txt",
        "\u{feff}route_id,agency_id,route_type\nR1,MT,3\n",
    );
    let result = validate(dir.path());
    assert_eq!(result.report.count("missing_required_column"), 0);
    assert_eq!(result.report.count("unknown_column"), 0);
}

#[test]
fn test_invalid_utf8_does_not_fail_the_feed() {
    let dir = write_feed(&valid_files());
    fs::write(
        dir.path().join("feed_info.txt"),
        b"feed_publisher_name,feed_publisher_url,feed_lang\nM\xfftro,https://metro.example,fr\n",
    )
    .unwrap();

    let result = validate(dir.path());
    assert_eq!(result.summary.tables_loaded, 7);
    assert_eq!(result.report.total(), 0, "{:?}", result.report.notices);
}

#[test]
fn test_row_width_mismatch_is_reported() {
    let dir = feed_with(
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\n\
         A,Alpha,48.8500,2.3500,extra\n\
         B,Beta,48.8600,2.3600\n\
         C,Gamma,48.8700,2.3700\n",
    );
    let result = validate(dir.path());

    assert_eq!(result.report.count("invalid_row_length"), 1);
    let notice = result.report.with_code("invalid_row_length").next().unwrap();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.field("csvRowNumber"), Some(&json!(1)));
    assert_eq!(notice.field("rowLength"), Some(&json!(5)));
    assert_eq!(notice.field("headerCount"), Some(&json!(4)));
}

// =============================================================================
// Rule Tests Through the Full Pipeline
// =============================================================================

#[test]
fn test_foreign_key_violation() {
    let dir = feed_with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:00:00,08:00:00,A,1\n\
         T1,08:05:00,08:05:00,Z,2\n",
    );
    let result = validate(dir.path());

    assert_eq!(result.report.count("foreign_key_violation"), 1);
    let notice = result.report.with_code("foreign_key_violation").next().unwrap();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.field("childFilename"), Some(&json!("stop_times.txt")));
    assert_eq!(notice.field("childFieldName"), Some(&json!("stop_id")));
    assert_eq!(notice.field("parentFilename"), Some(&json!("stops.txt")));
    assert_eq!(notice.field("fieldValue"), Some(&json!("Z")));
    assert_eq!(notice.field("csvRowNumber"), Some(&json!(2)));
}

#[test]
fn test_decreasing_shape_distance() {
    let dir = feed_with(
        "shapes.txt",
        "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\n\
         S1,48.8500,2.3500,1,0\n\
         S1,48.8510,2.3510,2,150\n\
         S1,48.8520,2.3520,3,120\n",
    );
    let result = validate(dir.path());

    assert_eq!(result.report.count("decreasing_shape_distance"), 1);
    let notice = result.report.with_code("decreasing_shape_distance").next().unwrap();
    assert_eq!(notice.field("shapeId"), Some(&json!("S1")));
    assert_eq!(notice.field("csvRowNumber"), Some(&json!(3)));
    assert_eq!(notice.field("prevCsvRowNumber"), Some(&json!(2)));
    assert_eq!(notice.field("shapePtSequence"), Some(&json!(3)));
}

#[test]
fn test_missing_calendar() {
    let mut files = valid_files();
    files.retain(|(n, _)| *n != "calendar.txt");
    let dir = write_feed(&files);
    let result = validate(dir.path());

    assert_eq!(result.report.count("missing_calendar_and_calendar_date_files"), 1);
    assert_eq!(result.summary.recommendation, "Fix 1 errors before publishing this feed.");
}

#[test]
fn test_duplicate_key_and_parse_errors() {
    let dir = feed_with(
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\n\
         A,Alpha,48.8500,2.3500\n\
         B,Beta,48.8600,2.3600\n\
         C,Gamma,48.8700,east\n\
         B,Beta again,48.8600,2.3600\n",
    );
    let result = validate(dir.path());

    assert_eq!(result.report.count("duplicate_key"), 1);
    assert_eq!(result.report.count("invalid_float"), 1);
    let duplicate = result.report.with_code("duplicate_key").next().unwrap();
    assert_eq!(duplicate.field("oldCsvRowNumber"), Some(&json!(2)));
    assert_eq!(duplicate.field("newCsvRowNumber"), Some(&json!(4)));
}

// =============================================================================
// Engine Guarantees
// =============================================================================

struct ExplodingRule;

impl Rule for ExplodingRule {
    fn name(&self) -> &str {
        "exploding"
    }

    fn required_tables(&self) -> Vec<&str> {
        Vec::new()
    }

    fn validate(&self, _feed: &Feed, notices: &mut NoticeContainer) -> Result<(), RuleError> {
        notices.push(feedcheck::Notice::new("partial_output", Severity::Info));
        panic!("boom");
    }
}

#[test]
fn test_failing_rule_is_isolated() {
    let catalog = gtfs::catalog();
    let config = FeedCheckConfig::default();
    let mut rules = default_rules(&catalog, &config.thresholds);
    rules.insert(0, Box::new(ExplodingRule));
    let checker = FeedCheck::with_rules(catalog, rules, config);

    let dir = feed_with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:00:00,08:00:00,A,1\n\
         T1,08:05:00,08:05:00,Z,2\n",
    );
    let result = checker.validate_dir(dir.path()).unwrap();

    assert_eq!(result.summary.rules_failed, vec!["exploding".to_string()]);
    assert_eq!(result.report.count("partial_output"), 0);
    assert_eq!(result.report.count(RUNTIME_EXCEPTION_CODE), 1);
    assert_eq!(result.report.count("foreign_key_violation"), 1);

    let codes: Vec<_> = result.report.notices.iter().map(|n| n.code.as_str()).collect();
    assert_eq!(codes, vec![RUNTIME_EXCEPTION_CODE, "foreign_key_violation"]);
    assert!(result.summary.recommendation.contains("could not complete"));
}

#[test]
fn test_parallel_and_sequential_reports_match() {
    let dir = feed_with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence,shape_dist_traveled\n\
         T1,08:00:00,08:00:00,A,1,0\n\
         T1,08:05:00,08:04:00,Q,2,900\n\
         T1,08:01:00,08:10:00,C,3,500\n\
         T2,09:00:00,09:00:00,C,1,\n\
         T2,,,B,2,\n",
    );

    let parallel = FeedCheck::new().validate_dir(dir.path()).unwrap();
    let sequential = FeedCheck::with_config(FeedCheckConfig {
        parallel: false,
        ..FeedCheckConfig::default()
    })
    .validate_dir(dir.path())
    .unwrap();
    let pinned = FeedCheck::with_config(FeedCheckConfig {
        threads: Some(2),
        ..FeedCheckConfig::default()
    })
    .validate_dir(dir.path())
    .unwrap();

    assert!(parallel.report.total() > 0);
    assert_eq!(parallel.report, sequential.report);
    assert_eq!(parallel.report, pinned.report);
}

#[test]
fn test_sampling_cap_from_json_config() {
    let config = FeedCheckConfig::from_json_str(r#"{"max_notices_per_code": 2}"#).unwrap();
    let dir = feed_with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:00:00,08:00:00,X1,1\n\
         T1,08:05:00,08:05:00,X2,2\n\
         T1,08:10:00,08:10:00,X3,3\n\
         T1,08:15:00,08:15:00,X4,4\n",
    );
    let result = FeedCheck::with_config(config).validate_dir(dir.path()).unwrap();

    assert_eq!(result.report.count("foreign_key_violation"), 4);
    assert_eq!(result.report.with_code("foreign_key_violation").count(), 2);
    assert_eq!(result.summary.notices_by_severity.error, 4);
}

#[test]
fn test_cancelled_run_reports_cancellation() {
    let dir = write_feed(&valid_files());
    let reader = feedcheck::FeedReader::new();
    let (tables, sources): (Vec<_>, Vec<_>) =
        reader.read_dir(dir.path()).unwrap().into_iter().unzip();

    let result = FeedCheck::new()
        .validate_with_cancel(tables, sources, &AtomicBool::new(true))
        .unwrap();
    assert!(result.cancelled);
    assert!(result.summary.recommendation.contains("cancelled"));
}

#[test]
fn test_result_serializes_to_json() {
    let dir = feed_with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:00:00,08:00:00,Z,1\n",
    );
    let result = validate(dir.path());
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["report"]["counts"]["foreign_key_violation"]["total"], json!(1));
    assert_eq!(value["summary"]["tables_loaded"], json!(6));
    assert_eq!(value["cancelled"], json!(false));
}
