use crate::config::BrowserConfig;
use crate::error::CheckError;
use crate::scrapers::document::RESULTS_TABLE;
use crate::scrapers::traits::PageDriver;
use crate::scrapers::types::SearchRequest;
use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::json;
use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const CHECKIN_INPUT: &str = "#date-input-fromd";
const NIGHTS_SELECT: &str = "#select-nights";
const ADULTS_SELECT: &str = "#select-adults";
const SEARCH_BUTTON: &str = "button.prime[type='submit']";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Headless Chrome session driving the booking page
pub struct ChromeSession {
    // Dropping the browser kills the Chrome process; keep it alive with the tab.
    browser: Browser,
    tab: Arc<Tab>,
    page_timeout: Duration,
}

impl ChromeSession {
    /// Launch Chrome and open the tab used for the whole run
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some((config.window_width, config.window_height)))
            .args(vec![OsStr::new("--disable-gpu")])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&config.user_agent, None, None)
            .context("Failed to set user agent")?;

        let page_timeout = Duration::from_secs(config.page_timeout_secs);
        tab.set_default_timeout(page_timeout);

        Ok(Self {
            browser,
            tab,
            page_timeout,
        })
    }

    fn evaluate_string(&self, expression: &str) -> Result<Option<String>> {
        let result = self.tab.evaluate(expression, false)?;
        Ok(result
            .value
            .and_then(|value| value.as_str().map(String::from)))
    }

    fn set_value_by_script(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .tab
            .wait_for_element(selector)
            .with_context(|| format!("Missing form field {}", selector))?;
        element.call_js_fn(
            "function(value) { this.value = value; }",
            vec![json!(value)],
            false,
        )?;
        debug!("Set {} to {}", selector, value);
        Ok(())
    }
}

impl PageDriver for ChromeSession {
    fn open(&mut self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;

        let deadline = Instant::now() + self.page_timeout;
        loop {
            if self.evaluate_string("document.readyState")?.as_deref() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CheckError::PageLoadTimeout(self.page_timeout).into());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn results_table_present(&mut self) -> Result<bool> {
        let result = self.tab.evaluate(
            &format!("document.querySelector(\"{}\") !== null", RESULTS_TABLE),
            false,
        )?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn submit_search(&mut self, request: &SearchRequest) -> Result<()> {
        let checkin = request.checkin.format("%Y-%m-%d").to_string();
        let checkin_input = self
            .tab
            .wait_for_element(CHECKIN_INPUT)
            .context("Missing check-in input")?;
        checkin_input.call_js_fn("function() { this.value = ''; }", vec![], false)?;
        checkin_input.type_into(&checkin)?;
        debug!("Set check-in date to: {}", checkin);

        self.set_value_by_script(NIGHTS_SELECT, &request.nights.to_string())?;
        self.set_value_by_script(ADULTS_SELECT, &request.adults.to_string())?;

        self.tab
            .wait_for_element(SEARCH_BUTTON)
            .context("Missing search button")?
            .click()?;
        debug!("Clicked Search button to load results");
        Ok(())
    }

    fn wait_for_results_table(&mut self, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(RESULTS_TABLE, timeout)
            .map_err(|_| CheckError::ResultsTableTimeout(timeout))?;
        Ok(())
    }

    fn page_source(&mut self) -> Result<String> {
        self.evaluate_string("document.documentElement.outerHTML")?
            .context("Could not get HTML from page")
    }

    fn close(self) -> Result<()> {
        let Self { browser, tab, .. } = self;
        if let Err(e) = tab.close(true) {
            debug!("Tab close failed: {:#}", e);
        }
        drop(browser);
        info!("Browser session closed.");
        Ok(())
    }
}
