use crate::harvest::catalog::{CatalogEntry, PageReference};
use crate::harvest::config::HarvestConfig;
use crate::harvest::error::HarvestError;
use crate::harvest::executor::{write_page_text, PageFetcher};
use crate::harvest::store::UrlStore;

use log::{debug, info};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::thread;
use std::time::Duration;

/// Summary of one harvest run for a single catalog entry
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Catalog entry the run covered
    pub model: String,

    /// Total review pages the entry spans
    pub total_pages: u64,

    /// Pages excluded because the live ledger already had them
    pub already_fetched: usize,

    /// Pages outstanding after ledger filtering
    pub outstanding: usize,

    /// Size of the throttled batch taken this run
    pub batch_size: usize,

    /// Pages skipped by the snapshot re-check inside the batch
    pub skipped_snapshot: usize,

    /// Pages actually fetched and recorded
    pub fetched: usize,

    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Produce every page of a catalog entry in a fresh random order.
///
/// Page numbers are distinct within one pass and drawn from
/// [1, total_page_count]; page 0 is a placeholder and never enumerated.
/// The order is reshuffled each run so the crawl pattern does not repeat.
pub fn enumerate_pages(entry: &CatalogEntry) -> Result<Vec<PageReference>, HarvestError> {
    let total = entry.total_page_count();

    let mut numbers: Vec<u64> = (1..=total).collect();
    numbers.shuffle(&mut rand::thread_rng());

    numbers
        .into_iter()
        .map(|n| entry.page_reference(n))
        .collect()
}

/// Throttled batch size: floor(outstanding * percentage / 100), clamped
/// to the outstanding count. No minimum-of-one override; small backlogs
/// under a small percentage legitimately yield an empty batch.
pub fn batch_size(outstanding: usize, subset_percentage: u64) -> usize {
    let size = outstanding * subset_percentage as usize / 100;
    size.min(outstanding)
}

/// Harvester for review pages of catalog entries
pub struct Harvester<'a> {
    /// Run configuration
    config: HarvestConfig,

    /// URL ledger, constructed once at startup and injected
    store: &'a dyn UrlStore,

    /// Page fetch executor boundary
    fetcher: &'a dyn PageFetcher,
}

impl<'a> Harvester<'a> {
    /// Create a harvester over an injected store and fetcher
    pub fn new(
        config: HarvestConfig,
        store: &'a dyn UrlStore,
        fetcher: &'a dyn PageFetcher,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
        }
    }

    /// Harvest one catalog entry: enumerate its pages, drop the ones the
    /// ledger already has, throttle the remainder to the configured
    /// percentage, then fetch the batch sequentially.
    pub fn run(&self, entry: &CatalogEntry) -> Result<RunReport, HarvestError> {
        entry.validate()?;

        let total_pages = entry.total_page_count();
        info!(
            "harvesting {}: {} reviews, {} per page, {} pages ({} backend)",
            entry.model,
            entry.review_count,
            entry.reviews_per_page,
            total_pages,
            self.store.name()
        );

        // Snapshot loaded once per run; the live store is still consulted
        // per page below, this map is the second dedup guard.
        let snapshot = self.store.load_urls().map_err(|e| {
            HarvestError::Storage(format!(
                "cannot load ledger from {} backend: {}",
                self.store.name(),
                e
            ))
        })?;
        debug!("loaded {} recorded URLs from the {} ledger", snapshot.len(), self.store.name());

        let candidates = enumerate_pages(entry)?;

        // Drop pages the live ledger already has, preserving order. A
        // presence-check failure propagates; it must never pass as "absent".
        let mut not_yet_fetched = Vec::new();
        for page in candidates {
            let present = self.store.is_url_present(page.url.as_str()).map_err(|e| {
                HarvestError::Storage(format!(
                    "presence check failed for page {} ({}) on {} backend: {}",
                    page.page_number,
                    page.url,
                    self.store.name(),
                    e
                ))
            })?;
            if present {
                debug!("already fetched, skipping page {} ({})", page.page_number, page.url);
                continue;
            }
            not_yet_fetched.push(page);
        }

        let already_fetched = total_pages as usize - not_yet_fetched.len();
        let size = batch_size(not_yet_fetched.len(), self.config.subset_percentage);
        let batch = &not_yet_fetched[..size];

        info!(
            "{}: {} pages outstanding, taking {} this run ({}%)",
            entry.model,
            not_yet_fetched.len(),
            size,
            self.config.subset_percentage
        );

        let mut fetched = 0;
        let mut skipped_snapshot = 0;
        let mut dispatched = 0;

        for page in batch {
            // Another process may have written the ledger since the run
            // started; the snapshot re-check catches what it saw at load.
            if snapshot.contains_key(page.url.as_str()) {
                debug!("in snapshot, skipping page {} ({})", page.page_number, page.url);
                skipped_snapshot += 1;
                continue;
            }

            if self.config.dry_run {
                info!("dry run: would fetch page {} ({})", page.page_number, page.url);
                continue;
            }

            // Politeness delay between successive dispatches
            if dispatched > 0 {
                thread::sleep(Duration::from_millis(self.config.page_delay_ms));
            }
            dispatched += 1;

            let text = self.fetcher.fetch(page)?;

            let path = write_page_text(&self.config.data_dir, page, &text)?;
            self.store.save_url(page.url.as_str()).map_err(|e| {
                HarvestError::Storage(format!(
                    "cannot record page {} ({}) on {} backend: {}",
                    page.page_number,
                    page.url,
                    self.store.name(),
                    e
                ))
            })?;
            fetched += 1;

            info!(
                "fetched page {} ({}) -> {}",
                page.page_number,
                page.url,
                path.display()
            );
        }

        let report = RunReport {
            model: entry.model.clone(),
            total_pages,
            already_fetched,
            outstanding: not_yet_fetched.len(),
            batch_size: size,
            skipped_snapshot,
            fetched,
            dry_run: self.config.dry_run,
        };

        info!(
            "{}: done, fetched {} of {} batched pages ({} skipped via snapshot, {} already recorded)",
            report.model, report.fetched, report.batch_size, report.skipped_snapshot, report.already_fetched
        );

        Ok(report)
    }
}
