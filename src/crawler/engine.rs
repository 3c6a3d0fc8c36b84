//! Crawl engine - main crawl loop
//!
//! This module contains the loop that pulls the next target from the work queue,
//! fetches it, stores what it finds and decides how long to wait before the next
//! request. It owns:
//! - The rate-limit backoff state machine
//! - Per-visit failure classification
//! - Cooperative shutdown via a cancellation token

use crate::crawler::backoff::Backoff;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{classify_status, Fetcher, ResponseClass};
use crate::state::{EngineState, ItemOutcome};
use crate::storage::{NewQueueItem, PageStore, QueueItem, StorageError, WorkQueue};
use crate::CrawlError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Counters collected over one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Queue items pulled, including rate-limited retries
    pub iterations: u64,
    pub pages_saved: u64,
    pub links_enqueued: u64,
    pub not_found: u64,
    pub rate_limited: u64,
    pub unparseable: u64,
    pub failed: u64,
}

impl CrawlReport {
    fn record(&mut self, outcome: ItemOutcome) {
        self.iterations += 1;
        match outcome {
            ItemOutcome::Saved { links_enqueued } => {
                self.pages_saved += 1;
                self.links_enqueued += links_enqueued as u64;
            }
            ItemOutcome::NotFound => self.not_found += 1,
            ItemOutcome::RateLimited => self.rate_limited += 1,
            ItemOutcome::Unparseable => self.unparseable += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Single-worker crawl engine
///
/// The engine is generic over its store and its transport so tests can swap in
/// an in-memory database and a scripted fetcher.
pub struct CrawlEngine<S, F> {
    storage: S,
    fetcher: F,
    seed_url: String,
    sleep_time: Duration,
    backoff: Backoff,
    cancel: CancellationToken,
    state: EngineState,
    report: CrawlReport,
}

impl<S, F> CrawlEngine<S, F>
where
    S: WorkQueue + PageStore,
    F: Fetcher,
{
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `storage` - Work queue and page store
    /// * `fetcher` - Transport used for every request
    /// * `seed_url` - Inserted as the first target when the queue is empty
    /// * `sleep_time` - Pause between requests; the backoff starts at ten times this
    /// * `cancel` - Polled once per iteration; cancelling it stops the crawl
    pub fn new(
        storage: S,
        fetcher: F,
        seed_url: impl Into<String>,
        sleep_time: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            storage,
            fetcher,
            seed_url: seed_url.into(),
            sleep_time,
            backoff: Backoff::new(sleep_time),
            cancel,
            state: EngineState::Running,
            report: CrawlReport::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs the crawl loop until the queue is exhausted or a stop is requested
    ///
    /// Per-item failures (404, 429, unparseable pages, other statuses, transport
    /// errors) are handled inside the loop. Storage errors end the run.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        if self.state.is_terminal() {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: EngineState::Running,
            });
        }

        tracing::info!("Starting crawl from {}", self.seed_url);
        let start_time = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Stop requested, finishing crawl");
                self.transition(EngineState::Stopping)?;
                break;
            }

            if self.step().await?.is_none() {
                break;
            }

            if self.report.iterations % 10 == 0 {
                tracing::info!(
                    "Progress: {} iterations, {} pages saved, {} pending",
                    self.report.iterations,
                    self.report.pages_saved,
                    self.storage.count_pending()?
                );
            }
        }

        self.transition(EngineState::Stopped)?;

        tracing::info!(
            "Crawl finished: {} pages saved, {} links queued in {:?}",
            self.report.pages_saved,
            self.report.links_enqueued,
            start_time.elapsed()
        );

        Ok(self.report.clone())
    }

    /// Performs one iteration: pull, visit, pause
    ///
    /// # Returns
    ///
    /// * `Ok(Some(outcome))` - An item was visited
    /// * `Ok(None)` - The queue is exhausted
    /// * `Err(CrawlError)` - A storage failure
    pub async fn step(&mut self) -> Result<Option<ItemOutcome>, CrawlError> {
        let item = match self.storage.next(Some(self.seed_url.as_str())) {
            Ok(item) => item,
            Err(StorageError::QueueEmpty) => {
                tracing::info!("Queue is empty, nothing left to crawl");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let outcome = self.visit(&item).await?;
        if outcome.retires_item() {
            self.storage.mark_done(item.id)?;
        }
        self.report.record(outcome);

        let wait = if outcome.resets_backoff() {
            self.backoff.reset();
            self.sleep_time
        } else {
            self.backoff.escalate()
        };
        self.pause(wait).await;

        Ok(Some(outcome))
    }

    /// Fetches one item and stores what it yields
    ///
    /// Retiring the item is left to the caller, based on the returned outcome.
    async fn visit(&mut self, item: &QueueItem) -> Result<ItemOutcome, CrawlError> {
        tracing::debug!("Processing URL: {} ({})", item.url, item.id);

        let response = match self.fetcher.fetch(&item.url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Could not fetch {}: {}", item.url, e);
                return Ok(ItemOutcome::Failed { status: None });
            }
        };

        match classify_status(response.status) {
            ResponseClass::Ok => self.store_page(item, &response.body),

            ResponseClass::NotFound => {
                tracing::error!("Server returned a 404 on: {}", item.url);
                Ok(ItemOutcome::NotFound)
            }

            ResponseClass::RateLimited => {
                tracing::error!(
                    "Rate limit exceeded on {}, waiting {:?}",
                    item.url,
                    self.backoff.current()
                );
                Ok(ItemOutcome::RateLimited)
            }

            ResponseClass::Other(status) => {
                tracing::error!("Received status {} at {}", status, item.url);
                Ok(ItemOutcome::Failed {
                    status: Some(status.as_u16()),
                })
            }
        }
    }

    /// Extracts a fetched page, saves it and queues its links
    fn store_page(&mut self, item: &QueueItem, body: &[u8]) -> Result<ItemOutcome, CrawlError> {
        let page = match extract(body) {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Could not parse page {}: {}", item.url, e);
                return Ok(ItemOutcome::Unparseable);
            }
        };

        self.storage.save(
            item.id,
            &page.title,
            page.description.as_deref(),
            &page.top_words,
        )?;

        let candidates: Vec<NewQueueItem> = page
            .links
            .into_iter()
            .map(|link| NewQueueItem::new(link, Some(item.id)))
            .collect();
        tracing::debug!("Found {} links at {}", candidates.len(), item.url);

        let links_enqueued = self.storage.enqueue_unique(&candidates)?;

        Ok(ItemOutcome::Saved { links_enqueued })
    }

    /// Sleeps for `duration`, waking early if a stop is requested
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Pause interrupted by stop request");
            }
            _ = tokio::time::sleep(duration) => {}
        }
    }

    fn transition(&mut self, next: EngineState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Engine {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
