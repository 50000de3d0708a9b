//! Batch extraction pipeline
//!
//! This module drives a list of URLs through fetch, parse and field extraction:
//! - **Fault isolation**: a URL that fails to fetch or parse becomes an error
//!   record; the batch always continues
//! - **Input order**: records come back in the order of the input URLs, also
//!   when several URLs are fetched at once
//! - **Progress**: observers are told `(completed, total)` after every URL
//! - **Cancellation**: checked before each URL starts; fetches already in
//!   flight complete and the partial result is returned
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```ignore
//! use extractly::{ExtractionPipeline, FieldSet};
//!
//! let fields: FieldSet = "title,h1,p,name=\"description\"".parse()?;
//! let pipeline = ExtractionPipeline::builder()
//!     .on_progress(|event| println!("{} of {}", event.completed, event.total))
//!     .build()?;
//!
//! let result = pipeline.run(&urls, &fields).await?;
//! ```
//!
//! ## With Cancellation
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel_token = CancellationToken::new();
//! let token_clone = cancel_token.clone();
//!
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     token_clone.cancel();
//! });
//!
//! let partial = pipeline.run_with_cancellation(&urls, &fields, cancel_token).await?;
//! ```

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use futures_util::{StreamExt, stream};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    ConfigError, FieldExtractor, FieldSet, HtmlDocument, HttpFetcher, ParseError, RawDocument,
    Record, RunError, RunResult, UrlFetcher,
};

const DEFAULT_CONCURRENCY: usize = 1;

/// Progress notification emitted after each URL completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// URLs finished so far, successful or not
    pub completed: usize,
    /// URLs in the run
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Completed share of the run, between 0.0 and 1.0
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Observer trait for receiving pipeline events
///
/// Implement this trait to render progress, collect custom metrics or
/// implement custom logging strategies.
///
/// # Example
///
/// ```ignore
/// use extractly::{PipelineObserver, ProgressEvent};
///
/// struct ProgressBar;
///
/// #[async_trait::async_trait]
/// impl PipelineObserver for ProgressBar {
///     async fn on_progress(&self, event: &ProgressEvent) {
///         println!("{:.0}%", event.fraction() * 100.0);
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait PipelineObserver: Send + Sync {
    /// Called right before a URL is fetched
    async fn on_url_started(&self, _index: usize, _url: &str) {}

    /// Called when a URL was fetched and its fields extracted
    async fn on_record(&self, _record: &Record) {}

    /// Called when a URL could not be fetched or parsed
    async fn on_url_failed(&self, _url: &str, _error: &str) {}

    /// Called after each URL completes, in increasing `completed` order
    async fn on_progress(&self, _event: &ProgressEvent) {}

    /// Called once when the run finishes or is cancelled
    async fn on_run_complete(&self, _stats: &RunStats) {}
}

/// Registry for managing multiple pipeline observers
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl ObserverRegistry {
    /// Create a new empty ObserverRegistry
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Register an observer to receive pipeline events
    pub fn register(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub async fn notify_url_started(&self, index: usize, url: &str) {
        for observer in &self.observers {
            observer.on_url_started(index, url).await;
        }
    }

    pub async fn notify_record(&self, record: &Record) {
        for observer in &self.observers {
            observer.on_record(record).await;
        }
    }

    pub async fn notify_url_failed(&self, url: &str, error: &str) {
        for observer in &self.observers {
            observer.on_url_failed(url, error).await;
        }
    }

    pub async fn notify_progress(&self, event: &ProgressEvent) {
        for observer in &self.observers {
            observer.on_progress(event).await;
        }
    }

    pub async fn notify_run_complete(&self, stats: &RunStats) {
        for observer in &self.observers {
            observer.on_run_complete(stats).await;
        }
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a plain closure to [`PipelineObserver::on_progress`]
pub struct ProgressCallback<F> {
    callback: Mutex<F>,
}

impl<F> ProgressCallback<F>
where
    F: FnMut(ProgressEvent) + Send,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback: Mutex::new(callback),
        }
    }
}

#[async_trait::async_trait]
impl<F> PipelineObserver for ProgressCallback<F>
where
    F: FnMut(ProgressEvent) + Send + 'static,
{
    async fn on_progress(&self, event: &ProgressEvent) {
        let mut callback = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        (*callback)(*event);
    }
}

/// Statistics of the current or last run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// URLs in the run
    pub total: usize,
    /// URLs finished, successful or not
    pub urls_processed: usize,
    /// URLs whose fields were extracted
    pub urls_succeeded: usize,
    /// URLs that became error records
    pub urls_failed: usize,
    /// When the run started
    pub start_time: Instant,
    /// When these stats were last updated
    pub last_update: Instant,
}

impl RunStats {
    /// Create empty stats starting now
    pub fn new(total: usize) -> Self {
        let now = Instant::now();
        Self {
            total,
            urls_processed: 0,
            urls_succeeded: 0,
            urls_failed: 0,
            start_time: now,
            last_update: now,
        }
    }

    /// Get elapsed time since the run started
    pub fn elapsed(&self) -> Duration {
        self.last_update.duration_since(self.start_time)
    }

    /// Calculate URLs processed per second
    pub fn urls_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.urls_processed as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Thread-safe statistics tracker with real-time broadcasting
pub struct StatsTracker {
    total: AtomicUsize,
    urls_succeeded: AtomicUsize,
    urls_failed: AtomicUsize,
    start_time: Mutex<Instant>,
    tx: watch::Sender<RunStats>,
}

impl StatsTracker {
    /// Create a new StatsTracker
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunStats::default());
        Self {
            total: AtomicUsize::new(0),
            urls_succeeded: AtomicUsize::new(0),
            urls_failed: AtomicUsize::new(0),
            start_time: Mutex::new(Instant::now()),
            tx,
        }
    }

    /// Subscribe to statistics updates
    pub fn subscribe(&self) -> watch::Receiver<RunStats> {
        self.tx.subscribe()
    }

    /// Reset the counters for a run over `total` URLs
    pub fn start(&self, total: usize) {
        // Relaxed is enough: stats are informational and don't affect control flow
        self.total.store(total, Ordering::Relaxed);
        self.urls_succeeded.store(0, Ordering::Relaxed);
        self.urls_failed.store(0, Ordering::Relaxed);
        *self.start_time.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.broadcast();
    }

    /// Record a URL whose fields were extracted
    pub fn url_succeeded(&self) {
        self.urls_succeeded.fetch_add(1, Ordering::Relaxed);
        self.broadcast();
    }

    /// Record a URL that became an error record
    pub fn url_failed(&self) {
        self.urls_failed.fetch_add(1, Ordering::Relaxed);
        self.broadcast();
    }

    /// Broadcast current statistics to all subscribers
    fn broadcast(&self) {
        // send_replace stores the value even when nobody is subscribed yet
        self.tx.send_replace(self.snapshot());
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> RunStats {
        let succeeded = self.urls_succeeded.load(Ordering::Relaxed);
        let failed = self.urls_failed.load(Ordering::Relaxed);
        RunStats {
            total: self.total.load(Ordering::Relaxed),
            urls_processed: succeeded + failed,
            urls_succeeded: succeeded,
            urls_failed: failed,
            start_time: *self.start_time.lock().unwrap_or_else(PoisonError::into_inner),
            last_update: Instant::now(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub(crate) concurrency: usize,
    pub(crate) request_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        Ok(())
    }

    /// Number of URLs fetched at the same time
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Timeout applied to the default HTTP fetcher, if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: None,
        }
    }
}

/// How a single URL ended
enum UrlOutcome {
    Extracted(Record),
    Failed { record: Record, error: String },
}

/// Pipeline that fetches URLs and extracts a fixed set of fields from each
///
/// URLs are processed one at a time by default. With a concurrency above one,
/// up to that many fetches run at once; records are still returned in input
/// order and progress still advances by exactly one per completed URL.
pub struct ExtractionPipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn UrlFetcher>,
    observers: Arc<ObserverRegistry>,
    stats: Arc<StatsTracker>,
}

impl ExtractionPipeline {
    /// Create a pipeline with default settings and the HTTP fetcher
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Create a pipeline builder for custom configuration
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The validated configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a snapshot of current run statistics
    pub fn stats(&self) -> RunStats {
        self.stats.snapshot()
    }

    /// Subscribe to real-time statistics updates
    pub fn subscribe_stats(&self) -> watch::Receiver<RunStats> {
        self.stats.subscribe()
    }

    /// Extract `fields` from every URL
    ///
    /// Returns one record per URL, in input order. Failed URLs are embedded as
    /// error records; only an empty URL list fails the run.
    pub async fn run(&self, urls: &[String], fields: &FieldSet) -> Result<RunResult, RunError> {
        self.run_internal(urls, fields, None).await
    }

    /// Extract `fields` from every URL until `cancel_token` is cancelled
    ///
    /// The token is checked before each URL starts. When it fires:
    /// - no further URLs are fetched
    /// - fetches already in flight complete and keep their records
    /// - the partial result is returned, with [`RunResult::is_cancelled`] set
    pub async fn run_with_cancellation(
        &self,
        urls: &[String],
        fields: &FieldSet,
        cancel_token: CancellationToken,
    ) -> Result<RunResult, RunError> {
        self.run_internal(urls, fields, Some(cancel_token)).await
    }

    async fn run_internal(
        &self,
        urls: &[String],
        fields: &FieldSet,
        cancel_token: Option<CancellationToken>,
    ) -> Result<RunResult, RunError> {
        if urls.is_empty() {
            return Err(RunError::NoUrls);
        }

        let total = urls.len();
        info!(
            total,
            fields = fields.fields().len(),
            concurrency = self.config.concurrency,
            "starting extraction run"
        );
        self.stats.start(total);

        // Written by index so completion order never affects record order
        let mut slots: Vec<Option<Record>> = vec![None; total];
        let mut completed = 0;

        let mut outcomes = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| {
                let cancel_token = cancel_token.clone();
                async move {
                    if cancel_token
                        .as_ref()
                        .is_some_and(CancellationToken::is_cancelled)
                    {
                        return None;
                    }
                    self.observers.notify_url_started(index, url).await;
                    Some((index, self.process_url(url, fields).await))
                }
            })
            .buffer_unordered(self.config.concurrency);

        while let Some(outcome) = outcomes.next().await {
            let Some((index, outcome)) = outcome else {
                continue;
            };

            let record = match outcome {
                UrlOutcome::Extracted(record) => {
                    self.stats.url_succeeded();
                    self.observers.notify_record(&record).await;
                    record
                }
                UrlOutcome::Failed { record, error } => {
                    warn!(url = %record.url(), %error, "url failed");
                    self.stats.url_failed();
                    self.observers.notify_url_failed(record.url(), &error).await;
                    record
                }
            };

            slots[index] = Some(record);
            completed += 1;
            debug!("Processing batch {completed} of {total}");
            self.observers
                .notify_progress(&ProgressEvent::new(completed, total))
                .await;
        }

        let records: Vec<Record> = slots.into_iter().flatten().collect();
        let cancelled = records.len() < total;
        if cancelled {
            info!(completed = records.len(), total, "extraction run cancelled");
        }

        let final_stats = self.stats.snapshot();
        info!(
            succeeded = final_stats.urls_succeeded,
            failed = final_stats.urls_failed,
            elapsed_ms = final_stats.elapsed().as_millis() as u64,
            "extraction run finished"
        );
        self.observers.notify_run_complete(&final_stats).await;

        Ok(RunResult::new(records, total, cancelled))
    }

    /// Fetch, parse and extract one URL, isolating any failure into its record
    async fn process_url(&self, url: &str, fields: &FieldSet) -> UrlOutcome {
        let result = match self.fetcher.fetch(url).await {
            Ok(raw) => build_record(url, &raw, fields).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(record) => UrlOutcome::Extracted(record),
            Err(error) => UrlOutcome::Failed {
                record: Record::failed(url, fields, &error),
                error,
            },
        }
    }
}

/// Parse a fetched document and apply every field to it
fn build_record(url: &str, raw: &RawDocument, fields: &FieldSet) -> Result<Record, ParseError> {
    let doc = HtmlDocument::parse(raw)?;
    Ok(Record::extracted(url, FieldExtractor::extract_all(&doc, fields)))
}

/// Builder for configuring an ExtractionPipeline
pub struct PipelineBuilder {
    config: PipelineConfig,
    fetcher: Option<Arc<dyn UrlFetcher>>,
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Create a new PipelineBuilder with default settings
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            fetcher: None,
            observers: Vec::new(),
        }
    }

    /// Set the number of URLs fetched at the same time (default: 1)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set a timeout for the default HTTP fetcher (default: none)
    ///
    /// Ignored when a custom fetcher is supplied.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Fetch through a custom [`UrlFetcher`] instead of HTTP
    pub fn fetcher(mut self, fetcher: Arc<dyn UrlFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Register an observer to receive pipeline events
    pub fn observe_with(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Call `callback` after each URL completes
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: FnMut(ProgressEvent) + Send + 'static,
    {
        self.observe_with(Arc::new(ProgressCallback::new(callback)))
    }

    /// Build the ExtractionPipeline with the configured settings
    pub fn build(self) -> Result<ExtractionPipeline, ConfigError> {
        self.config.validate()?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let mut builder = HttpFetcher::builder();
                if let Some(timeout) = self.config.request_timeout {
                    builder = builder.timeout(timeout);
                }
                Arc::new(builder.build()?)
            }
        };

        let mut registry = ObserverRegistry::new();
        for observer in self.observers {
            registry.register(observer);
        }

        Ok(ExtractionPipeline {
            config: self.config,
            fetcher,
            observers: Arc::new(registry),
            stats: Arc::new(StatsTracker::new()),
        })
    }
}
