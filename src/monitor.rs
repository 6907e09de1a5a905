//! Run orchestration: check, report, and optionally repeat on an interval.

use crate::config::Config;
use crate::mailer::Mailer;
use crate::models::{RoomRecord, RunResult};
use crate::report::ReportRenderer;
use crate::scrapers::extractor::Extractor;
use crate::scrapers::traits::PageDriver;
use crate::scrapers::types::SearchRequest;
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const SUBJECT: &str = "Opora Country Living - Room Availability Update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Check once and always send the report
    Once,
    /// Check every interval and report only when rooms are found
    Loop,
}

/// Owns the browser session for the whole run
pub struct Monitor<D: PageDriver, M: Mailer> {
    driver: D,
    mailer: M,
    extractor: Extractor,
    renderer: ReportRenderer,
    request: SearchRequest,
    url: String,
    interval: Duration,
}

impl<D: PageDriver, M: Mailer> Monitor<D, M> {
    pub fn new(driver: D, mailer: M, config: &Config) -> Self {
        Self {
            driver,
            mailer,
            extractor: Extractor::new(config.extractor_settings(), config.retry_policy()),
            renderer: ReportRenderer::new(&config.template_path, &config.search.currency),
            request: config.search.clone(),
            url: config.target_url(),
            interval: config.interval(),
        }
    }

    /// Run in `mode`, then release the browser session.
    ///
    /// Returns the rooms found in single-shot mode, or `None` when looping or
    /// interrupted. `shutdown` is armed before the first check and observed
    /// between checks; the session is closed exactly once on every path.
    pub async fn run(
        mut self,
        mode: RunMode,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Option<RunResult>> {
        info!("Starting availability checker for Opora Country Living...");
        tokio::pin!(shutdown);

        let outcome = if interrupted(shutdown.as_mut()).await {
            info!("Interrupted before the first check");
            Ok(None)
        } else {
            match mode {
                RunMode::Once => self.run_once(shutdown.as_mut()).await,
                RunMode::Loop => self.run_loop(shutdown.as_mut()).await.map(|()| None),
            }
        };

        if let Err(e) = &outcome {
            match mode {
                RunMode::Once => error!("Availability check failed: {:#}", e),
                RunMode::Loop => error!("Stopping loop after error: {:#}", e),
            }
        }

        let Self { driver, .. } = self;
        if let Err(e) = driver.close() {
            warn!("Failed to close browser session: {:#}", e);
        }

        outcome
    }

    async fn run_once<F: Future<Output = ()>>(
        &mut self,
        shutdown: Pin<&mut F>,
    ) -> Result<Option<RunResult>> {
        let rooms = self.check()?;
        if interrupted(shutdown).await {
            info!("Interrupted by user; skipping report");
            return Ok(None);
        }
        self.report(&rooms)?;
        Ok(Some(rooms))
    }

    async fn run_loop<F: Future<Output = ()>>(&mut self, mut shutdown: Pin<&mut F>) -> Result<()> {
        let mut checks: u64 = 0;
        loop {
            let rooms = self.check()?;
            checks += 1;
            if !rooms.is_empty() {
                self.report(&rooms)?;
            }

            debug!("Next check in {:?}", self.interval);
            tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    info!("Loop interrupted by user after {} check(s)", checks);
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn check(&mut self) -> Result<RunResult> {
        self.extractor
            .check_with_retry(&mut self.driver, &self.url, &self.request)
    }

    /// Render and mail the report; a delivery failure is logged, a render failure is not recoverable
    fn report(&self, rooms: &[RoomRecord]) -> Result<()> {
        let report = self.renderer.render(rooms, self.request.max_price)?;
        debug!("Rendered report listing {} room(s)", report.room_count);

        if let Err(e) = self.mailer.send_html(SUBJECT, &report.html) {
            warn!("Availability report not delivered: {:#}", e);
        }
        Ok(())
    }
}

/// Poll `shutdown` once without waiting.
///
/// The first poll also registers the underlying signal listener, so an
/// interrupt arriving during a blocking check is held until the next poll.
async fn interrupted<F: Future<Output = ()>>(shutdown: Pin<&mut F>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = std::future::ready(()) => false,
    }
}
