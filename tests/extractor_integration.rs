//! Integration tests for the results-table extraction using a saved page.

use opora_checker::models::RoomRecord;
use opora_checker::report::{render_report, ReportMeta};
use opora_checker::scrapers::{extract_rooms, ResultsDocument};

const RESULTS_FIXTURE: &str = include_str!("fixtures/results_page.html");

#[test]
fn test_extract_available_rooms_from_fixture() {
    let doc = ResultsDocument::parse(RESULTS_FIXTURE);
    assert!(doc.has_results_table());

    let rooms = extract_rooms(&doc, None);
    assert_eq!(
        rooms,
        vec![
            RoomRecord::new("Garden Suite", 1250.50),
            RoomRecord::new("Garden Suite", 1650.0),
            RoomRecord::new("Vineyard Cabin", 1500.0),
        ]
    );
}

#[test]
fn test_ceiling_applied_during_extraction() {
    let doc = ResultsDocument::parse(RESULTS_FIXTURE);
    let rooms = extract_rooms(&doc, Some(1500.0));

    let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Garden Suite", "Vineyard Cabin"]);
    assert!(rooms.iter().all(|r| r.price <= 1500.0));
}

#[test]
fn test_report_drops_rooms_at_the_ceiling() {
    let doc = ResultsDocument::parse(RESULTS_FIXTURE);
    let rooms = extract_rooms(&doc, Some(1500.0));

    let meta = ReportMeta {
        generated_at: "September 01, 2025 10:00 AM +03:00".to_string(),
        scan_id: "deadbeef".to_string(),
    };
    let report = render_report("{{ROOM_ROWS}}|{{ROOM_COUNT}}", &rooms, 1500.0, "ILS", &meta);

    assert_eq!(report.room_count, 1);
    assert!(report.html.contains(">Garden Suite</td>"));
    assert!(report.html.contains(">1250.50</td>"));
    assert!(!report.html.contains("Vineyard Cabin"));
    assert!(report.html.ends_with("|1"));
}

#[test]
fn test_page_without_reserve_controls_is_empty() {
    let doc = ResultsDocument::parse(r#"<table class="data rmtbl"><tr><td>No rates</td></tr></table>"#);
    assert!(doc.has_results_table());
    assert!(extract_rooms(&doc, Some(1500.0)).is_empty());
}

#[test]
fn test_shipped_template_uses_configured_currency() {
    let template = include_str!("../templates/email_template.html");
    let meta = ReportMeta {
        generated_at: "September 01, 2025 10:00 AM +03:00".to_string(),
        scan_id: "deadbeef".to_string(),
    };
    let rooms = vec![RoomRecord::new("Garden Suite", 310.0)];

    let report = render_report(template, &rooms, 400.0, "EUR", &meta);
    assert!(report.html.contains("under 400.00 EUR"));
    assert!(!report.html.contains("ILS"));
    assert!(!report.html.contains("{{"));
}
