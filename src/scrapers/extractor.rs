use crate::models::{RoomRecord, RunResult};
use crate::scrapers::document::ResultsDocument;
use crate::scrapers::retry::RetryPolicy;
use crate::scrapers::traits::{DocumentQuery, PageDriver, ReserveControl};
use crate::scrapers::types::SearchRequest;
use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const BOOK_LABEL: &str = "Book Now";
const AVAILABLE_STATUS: &str = "AVL";

/// Timing knobs for one availability check
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// How long to wait for the results table after the form
    pub table_timeout: Duration,
    /// Pause after submitting the search form
    pub settle: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            table_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(5),
        }
    }
}

/// Scrapes the booking engine's results table for bookable rooms
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    settings: ExtractorSettings,
    retry: RetryPolicy,
}

impl Extractor {
    pub fn new(settings: ExtractorSettings, retry: RetryPolicy) -> Self {
        Self { settings, retry }
    }

    /// [`Extractor::check_availability`] wrapped in the retry policy
    pub fn check_with_retry<D: PageDriver>(
        &self,
        driver: &mut D,
        url: &str,
        request: &SearchRequest,
    ) -> Result<RunResult> {
        self.retry.run(|attempt| {
            debug!("Availability check attempt {}", attempt);
            self.check_availability(&mut *driver, url, request)
        })
    }

    /// One pass: load the page, search if needed, and read the results table
    pub fn check_availability<D: PageDriver>(
        &self,
        driver: &mut D,
        url: &str,
        request: &SearchRequest,
    ) -> Result<RunResult> {
        info!("Checking availability at {}", url);
        driver.open(url).context("Failed to load booking page")?;
        debug!("DOM fully loaded");

        if driver.results_table_present()? {
            debug!("Results table already loaded, skipping form submission");
        } else {
            match driver.submit_search(request) {
                Ok(()) => {
                    debug!("Submitted search form for {}", request.checkin);
                    thread::sleep(self.settings.settle);
                }
                Err(e) => warn!("Could not submit search form: {:#}", e),
            }
        }

        driver
            .wait_for_results_table(self.settings.table_timeout)
            .context("Results table never appeared")?;
        debug!("Results table loaded");

        let source = driver.page_source().context("Failed to read page source")?;
        let document = ResultsDocument::parse(&source);
        let rooms = extract_rooms(&document, request.price_ceiling());

        if rooms.is_empty() {
            info!("❌ No available rooms found.");
        } else {
            info!("✅ Found {} available room(s):", rooms.len());
            for room in &rooms {
                info!("Room: {}, Price: {} {}", room.name, room.price, request.currency);
            }
        }

        Ok(rooms)
    }
}

/// Collect every enabled, available, priced room at or below `max_price`.
///
/// Rows that cannot be read are logged and skipped; a page without any
/// reserve controls yields an empty list.
pub fn extract_rooms<Q: DocumentQuery>(document: &Q, max_price: Option<f64>) -> RunResult {
    let controls = document.reserve_controls();
    debug!("Found {} reserve controls", controls.len());

    let mut rooms = Vec::new();
    for (idx, control) in controls.iter().enumerate() {
        let n = idx + 1;
        match extract_row(control, n, max_price) {
            Ok(Some(room)) => {
                debug!("Control {}: added room {} at {}", n, room.name, room.price);
                rooms.push(room);
            }
            Ok(None) => {}
            Err(e) => warn!("Control {}: could not extract room details: {:#}", n, e),
        }
    }
    rooms
}

fn extract_row<C: ReserveControl>(
    control: &C,
    n: usize,
    max_price: Option<f64>,
) -> Result<Option<RoomRecord>> {
    if !control.is_enabled() || !control.label().contains(BOOK_LABEL) {
        debug!("Control {}: not a bookable button", n);
        return Ok(None);
    }

    let status = control.row_attribute("data-status")?;
    if status.as_deref() != Some(AVAILABLE_STATUS) {
        debug!("Control {}: skipping non-available room (status: {:?})", n, status);
        return Ok(None);
    }

    let name = control.preceding_room_name()?;

    let Some(price) = control.price_texts()?.iter().find_map(|t| parse_price(t)) else {
        warn!("Control {}: could not extract price for room: {}", n, name);
        return Ok(None);
    };

    if let Some(max) = max_price {
        if price > max {
            debug!("Control {}: skipping {} at {} (exceeds {})", n, name, price, max);
            return Ok(None);
        }
    }

    Ok(Some(RoomRecord { name, price }))
}

/// Parse a currency-formatted amount such as `₪1,250.50` or `1,250 ILS`.
///
/// Returns `None` for empty, negative or otherwise unparsable text.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !is_currency_symbol(*c))
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c.is_ascii_alphabetic());

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '₪' | '$' | '€' | '£' | '¥' | '₽' | '₹' | '¢')
}
