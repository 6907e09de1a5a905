//! Results-table queries over an HTML snapshot of the booking page.

use crate::scrapers::traits::{DocumentQuery, ReserveControl};
use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};

pub const RESULTS_TABLE: &str = "table.data.rmtbl";
const RESERVE_BUTTON: &str = "button[id^='rate-btn-']";
const ROOM_NAME: &str = "td.name";
const PRICE_VALUE: &str = "td.price div.val";

/// Parsed snapshot of the page
pub struct ResultsDocument {
    html: Html,
}

impl ResultsDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn has_results_table(&self) -> bool {
        selector(RESULTS_TABLE)
            .map(|sel| self.html.select(&sel).next().is_some())
            .unwrap_or(false)
    }
}

impl DocumentQuery for ResultsDocument {
    type Control<'a> = SnapshotControl<'a>;

    fn reserve_controls(&self) -> Vec<SnapshotControl<'_>> {
        let Ok(sel) = selector(RESERVE_BUTTON) else {
            return Vec::new();
        };
        self.html
            .select(&sel)
            .map(|button| SnapshotControl { button })
            .collect()
    }
}

/// A reserve button inside the snapshot
pub struct SnapshotControl<'a> {
    button: ElementRef<'a>,
}

impl<'a> SnapshotControl<'a> {
    /// The `<tr>` holding this button's rate
    fn rate_row(&self) -> Result<ElementRef<'a>> {
        self.button
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.value().name() == "tr"
                    && (el.value().classes().any(|c| c == "solo")
                        || el.value().attr("data-rate").is_some())
            })
            .ok_or_else(|| anyhow!("reserve control has no enclosing rate row"))
    }
}

impl ReserveControl for SnapshotControl<'_> {
    fn is_enabled(&self) -> bool {
        self.button.value().attr("disabled").is_none()
    }

    fn label(&self) -> String {
        text_of(self.button)
    }

    fn row_attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.rate_row()?.value().attr(name).map(String::from))
    }

    fn preceding_room_name(&self) -> Result<String> {
        let row = self.rate_row()?;
        let header = row
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr" && el.value().attr("class") == Some("room"))
            .context("no room header row precedes the rate row")?;

        let name_sel = selector(ROOM_NAME)?;
        let name = header
            .select(&name_sel)
            .next()
            .map(text_of)
            .context("room header row has no name cell")?;
        Ok(name)
    }

    fn price_texts(&self) -> Result<Vec<String>> {
        let row = self.rate_row()?;
        let price_sel = selector(PRICE_VALUE)?;
        Ok(row.select(&price_sel).map(text_of).collect())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {}: {:?}", css, e))
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
