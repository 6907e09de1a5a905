use crate::scrapers::types::SearchRequest;
use anyhow::Result;
use std::time::Duration;

/// A live page the checker can steer.
///
/// Implemented by the headless Chrome session and by scripted fakes in tests.
/// The session is opened once per run and released through [`PageDriver::close`],
/// which consumes it so it cannot be released twice.
pub trait PageDriver {
    /// Navigate to `url` and block until the document reports it has loaded
    fn open(&mut self, url: &str) -> Result<()>;

    /// Whether the results table is already on the page
    fn results_table_present(&mut self) -> Result<bool>;

    /// Fill in and submit the search form
    fn submit_search(&mut self, request: &SearchRequest) -> Result<()>;

    /// Block until the results table appears or `timeout` elapses
    fn wait_for_results_table(&mut self, timeout: Duration) -> Result<()>;

    /// Current page markup
    fn page_source(&mut self) -> Result<String>;

    /// Release the session
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Structured-document queries the row extraction needs.
pub trait DocumentQuery {
    type Control<'a>: ReserveControl
    where
        Self: 'a;

    /// Every row-level reserve control, in document order
    fn reserve_controls(&self) -> Vec<Self::Control<'_>>;
}

/// A single reserve control and the table rows around it
pub trait ReserveControl {
    fn is_enabled(&self) -> bool;

    /// Visible label text
    fn label(&self) -> String;

    /// Attribute of the rate row enclosing this control
    fn row_attribute(&self, name: &str) -> Result<Option<String>>;

    /// Name cell of the nearest preceding room header row
    fn preceding_room_name(&self) -> Result<String>;

    /// Raw text of every price value cell in the rate row
    fn price_texts(&self) -> Result<Vec<String>>;
}
