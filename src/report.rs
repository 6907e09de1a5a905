//! HTML availability report filled into an external template.

use crate::error::CheckError;
use crate::models::RoomRecord;
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::error;
use uuid::Uuid;

const ROOM_ROW: &str = r#"
            <tr>
              <td style="border: 1px solid #d1d5db; padding: 12px; text-align: left; background-color: #ffffff; font-size: 13px; color: #374151;">{name}</td>
              <td style="border: 1px solid #d1d5db; padding: 12px; text-align: left; font-weight: 600; color: #15803d; font-size: 13px;">{price}</td>
            </tr>
            "#;

const EMPTY_ROW: &str = r#"
        <tr>
          <td colspan="2" style="border: 1px solid #d1d5db; padding: 12px; text-align: center; background-color: #ffffff; font-size: 13px; color: #374151;">{message}</td>
        </tr>
        "#;

/// Values substituted into the template besides the room rows
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub generated_at: String,
    pub scan_id: String,
}

impl ReportMeta {
    /// Current local time and a fresh 8-character scan id
    pub fn now() -> Self {
        Self {
            generated_at: Local::now().format("%B %d, %Y %I:%M %p %Z").to_string(),
            scan_id: Uuid::new_v4().simple().to_string()[..8].to_string(),
        }
    }
}

/// A rendered report
#[derive(Debug, Clone)]
pub struct Report {
    pub html: String,
    /// Rooms listed in the report
    pub room_count: usize,
}

pub struct ReportRenderer {
    template_path: PathBuf,
    currency: String,
}

impl ReportRenderer {
    pub fn new(template_path: impl Into<PathBuf>, currency: impl Into<String>) -> Self {
        Self {
            template_path: template_path.into(),
            currency: currency.into(),
        }
    }

    /// Load the template and render `rooms` into it
    pub fn render(&self, rooms: &[RoomRecord], max_price: f64) -> Result<Report> {
        let template = std::fs::read_to_string(&self.template_path).map_err(|e| {
            error!("{} not found: {}", self.template_path.display(), e);
            CheckError::TemplateMissing(self.template_path.clone())
        })?;
        Ok(render_report(
            &template,
            rooms,
            max_price,
            &self.currency,
            &ReportMeta::now(),
        ))
    }
}

/// Rooms strictly under `max_price`, cheapest first
pub fn rooms_under(rooms: &[RoomRecord], max_price: f64) -> Vec<&RoomRecord> {
    let mut listed: Vec<&RoomRecord> = rooms.iter().filter(|r| r.price < max_price).collect();
    listed.sort_by(|a, b| a.price.total_cmp(&b.price));
    listed
}

pub fn render_report(
    template: &str,
    rooms: &[RoomRecord],
    max_price: f64,
    currency: &str,
    meta: &ReportMeta,
) -> Report {
    let listed = rooms_under(rooms, max_price);

    let room_rows = if listed.is_empty() {
        EMPTY_ROW.replace(
            "{message}",
            &format!("No rooms available under {:.2} {}.", max_price, currency),
        )
    } else {
        listed
            .iter()
            .map(|room| {
                ROOM_ROW
                    .replace("{price}", &format!("{:.2}", room.price))
                    .replace("{name}", &escape_html(&room.name))
            })
            .collect()
    };

    let html = template
        .replace("{{ROOM_ROWS}}", &room_rows)
        .replace("{{CURRENT_DATE}}", &meta.generated_at)
        .replace("{{ROOM_COUNT}}", &listed.len().to_string())
        .replace("{{SCAN_ID}}", &meta.scan_id)
        .replace("{{MAX_PRICE}}", &format!("{:.2}", max_price))
        .replace("{{CURRENCY}}", currency);

    Report {
        html,
        room_count: listed.len(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TEMPLATE: &str =
        "<table>{{ROOM_ROWS}}</table><p>{{ROOM_COUNT}} under {{MAX_PRICE}}</p><i>{{CURRENT_DATE}} #{{SCAN_ID}}</i>";

    fn meta() -> ReportMeta {
        ReportMeta {
            generated_at: "October 19, 2026 09:00 AM +03:00".to_string(),
            scan_id: "1a2b3c4d".to_string(),
        }
    }

    #[test]
    fn test_ceiling_is_strict_and_rows_sorted() {
        let rooms = vec![
            RoomRecord::new("A", 1800.0),
            RoomRecord::new("B", 1200.0),
            RoomRecord::new("C", 1500.0),
        ];

        let report = render_report(TEMPLATE, &rooms, 1500.0, "ILS", &meta());
        assert_eq!(report.room_count, 1);
        assert!(report.html.contains(">B</td>"));
        assert!(report.html.contains(">1200.00</td>"));
        assert!(!report.html.contains(">A</td>"));
        assert!(!report.html.contains(">C</td>"));
        assert!(report.html.contains("<p>1 under 1500.00</p>"));
    }

    #[test]
    fn test_rooms_under_sorts_ascending() {
        let rooms = vec![
            RoomRecord::new("Loft", 900.0),
            RoomRecord::new("Cabin", 450.5),
            RoomRecord::new("Suite", 1200.0),
        ];

        let names: Vec<_> = rooms_under(&rooms, 1500.0).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cabin", "Loft", "Suite"]);
    }

    #[test]
    fn test_empty_list_renders_one_placeholder() {
        let report = render_report(TEMPLATE, &[], 1500.0, "ILS", &meta());
        assert_eq!(report.room_count, 0);
        assert_eq!(report.html.matches("<tr>").count(), 1);
        assert!(report.html.contains("No rooms available under 1500.00 ILS."));
        assert!(report.html.contains("<p>0 under 1500.00</p>"));
    }

    #[test]
    fn test_metadata_is_substituted() {
        let report = render_report(TEMPLATE, &[], 1500.0, "ILS", &meta());
        assert!(report.html.contains("October 19, 2026 09:00 AM +03:00 #1a2b3c4d"));
        assert!(!report.html.contains("{{"));
    }

    #[test]
    fn test_currency_follows_search() {
        let template = "<p>{{ROOM_COUNT}} under {{MAX_PRICE}} {{CURRENCY}}</p>";
        let rooms = vec![RoomRecord::new("Cabin", 120.0)];

        let report = render_report(template, &rooms, 250.0, "EUR", &meta());
        assert_eq!(report.html, "<p>1 under 250.00 EUR</p>");
    }

    #[test]
    fn test_room_names_are_escaped() {
        let rooms = vec![RoomRecord::new("Bed & <Breakfast>", 100.0)];
        let report = render_report(TEMPLATE, &rooms, 1500.0, "ILS", &meta());
        assert!(report.html.contains("Bed &amp; &lt;Breakfast&gt;"));
    }

    #[test]
    fn test_scan_id_is_short() {
        let meta = ReportMeta::now();
        assert_eq!(meta.scan_id.len(), 8);
        assert!(meta.scan_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_render_reads_template_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", TEMPLATE).unwrap();

        let renderer = ReportRenderer::new(file.path(), "ILS");
        let report = renderer.render(&[RoomRecord::new("B", 1200.0)], 1500.0).unwrap();
        assert_eq!(report.room_count, 1);
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let renderer = ReportRenderer::new("/nonexistent/email_template.html", "ILS");
        let err = renderer.render(&[], 1500.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckError>(),
            Some(CheckError::TemplateMissing(_))
        ));
    }
}
