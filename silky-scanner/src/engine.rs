//! The traversal engine: pulls entries off the frontier, visits them through
//! a [`PageFetcher`] and feeds discovered links back, under the scope policy
//! and visit budget of one run.
//!
//! Direct mode walks depth-first in document order using an explicit stack.
//! Smart mode visits the seeds, then drains a priority queue scored against
//! the target URL until the target has been visited.
//!
//! With one worker the walk is strictly sequential. With more, tokio tasks
//! share the frontier behind a mutex; visitation stays at-most-once but the
//! order is only approximately depth-first or priority-first.

use crate::bundle::{ResultBundle, pack};
use crate::budget::{Admission, VisitBudget};
use crate::cookies;
use crate::error::{Result, ScanError};
use crate::fetcher::PageFetcher;
use crate::frontier::{Frontier, FrontierEntry};
use crate::lineage::LineageTracker;
use crate::observer::{CrawlObserver, TracingObserver};
use crate::priority::PriorityScorer;
use crate::result::{CollectedRecord, ImageRecord, PageRecord};
use crate::scope::{ScopeConfig, ScopePolicy, configured};
use crate::stats::StatsAggregator;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TraversalMode {
    #[default]
    Direct,
    Smart {
        target: String,
    },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    pub workers: usize,
    pub mode: TraversalMode,
    pub scope: ScopeConfig,
    /// Lowercased; pages whose text lacks it are skipped.
    pub content_filter: Option<String>,
    pub image_only: bool,
    pub cookies: BTreeMap<String, String>,
    pub deadline: Option<Duration>,
    pub page_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_pages: 0,
            workers: 1,
            mode: TraversalMode::Direct,
            scope: ScopeConfig::default(),
            content_filter: None,
            image_only: false,
            cookies: BTreeMap::new(),
            deadline: None,
            page_timeout: Duration::from_secs(15),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Switches to smart mode when `target` is set (`N/A` and blanks are not).
    pub fn with_stop_on_url(mut self, target: Option<&str>) -> Self {
        self.mode = match configured(target) {
            Some(target) => TraversalMode::Smart { target },
            None => TraversalMode::Direct,
        };
        self
    }

    pub fn with_scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_content_filter(mut self, filter: Option<&str>) -> Self {
        self.content_filter = configured(filter).map(|f| f.to_lowercase());
        self
    }

    pub fn with_image_only(mut self, image_only: bool) -> Self {
        self.image_only = image_only;
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    SeedVisiting,
    DirectRecursing,
    SmartDraining,
    Done,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    FrontierExhausted,
    BudgetExhausted,
    TargetReached,
    Cancelled,
    TimedOut,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::FrontierExhausted => "frontier exhausted",
            Termination::BudgetExhausted => "page budget exhausted",
            Termination::TargetReached => "target reached",
            Termination::Cancelled => "cancelled",
            Termination::TimedOut => "timed out",
        }
    }
}

/// External stop signal. Once raised no new fetch is started.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub bundle: ResultBundle,
    pub termination: Termination,
}

/// Everything one run owns. Built fresh by [`TraversalEngine::run`] and
/// shared with worker tasks.
struct Visitor<F: PageFetcher> {
    fetcher: Arc<F>,
    observer: Arc<dyn CrawlObserver>,
    progress: Option<ProgressCallback>,
    stop: StopHandle,
    deadline: Option<Instant>,
    page_timeout: Duration,
    content_filter: Option<String>,
    image_only: bool,
    scope: ScopePolicy,
    scorer: Option<PriorityScorer>,
    budget: VisitBudget,
    stats: StatsAggregator,
    lineage: LineageTracker,
    records: Mutex<Vec<CollectedRecord>>,
    target_reached: AtomicBool,
}

impl<F: PageFetcher> Visitor<F> {
    fn records(&self) -> MutexGuard<'_, Vec<CollectedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn halt_reason(&self) -> Option<Termination> {
        if self.stop.is_stopped() {
            return Some(Termination::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Some(Termination::TimedOut);
        }
        if self.target_reached.load(Ordering::SeqCst) {
            return Some(Termination::TargetReached);
        }
        if self.budget.is_exhausted() {
            return Some(Termination::BudgetExhausted);
        }
        None
    }

    /// Like `halt_reason`, but a run whose budget ran out together with
    /// its frontier is reported as exhausted rather than capped.
    fn termination(&self, frontier_empty: bool) -> Option<Termination> {
        match self.halt_reason() {
            Some(Termination::BudgetExhausted) if frontier_empty => {
                Some(Termination::FrontierExhausted)
            }
            reason => reason,
        }
    }

    /// Visits one entry and returns the in-scope children to enqueue.
    async fn visit(&self, worker_id: usize, entry: &FrontierEntry) -> Vec<FrontierEntry> {
        if self.halt_reason().is_some() {
            return Vec::new();
        }

        match self.budget.begin_visit(&entry.url, entry.depth) {
            Admission::Accept => {}
            Admission::RejectDuplicate | Admission::RejectPageCap => return Vec::new(),
            Admission::RejectDepth => {
                self.budget.record_skip();
                return Vec::new();
            }
        }

        self.lineage.record_path(&entry.url, &entry.path);
        if let Some(ref callback) = self.progress {
            callback(worker_id, entry.url.clone());
        }

        let cookies_before = self.fetcher.cookies(&entry.url).await;

        let fetched = match tokio::time::timeout(self.page_timeout, self.fetcher.fetch(&entry.url)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Fetch(format!(
                "timed out after {} s",
                self.page_timeout.as_secs_f64()
            ))),
        };

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                self.stats.record_error(&entry.url);
                self.observer.fetch_failed(&entry.url, &e);
                return Vec::new();
            }
        };

        self.stats.record_page(page.content_type.as_deref());
        self.stats.record_images(page.images.len());
        self.observer
            .page_visited(&entry.url, entry.depth, page.status, page.load_time);
        self.observer.performance(
            &entry.url,
            "load_time",
            page.load_time.as_secs_f64() * 1000.0,
        );
        for image in &page.images {
            self.observer.image_discovered(&entry.url, image);
        }
        for script in &page.scripts {
            self.observer.script_discovered(&entry.url, script);
        }

        let changed = cookies::diff(&cookies_before, &page.cookies_after);
        if !changed.is_empty() {
            self.observer.cookies_changed(&entry.url, &changed);
        }

        self.stats.record_outgoing(&entry.url, &page.discovered_links);

        let is_target = self
            .scorer
            .as_ref()
            .is_some_and(|scorer| scorer.is_target(&entry.url) || scorer.is_target(&page.final_url));

        if let Some(ref filter) = self.content_filter
            && !page.text_content.to_lowercase().contains(filter.as_str())
        {
            debug!("Content filter '{}' not found on {}", filter, entry.url);
            self.budget.record_skip();
            if is_target {
                info!("Target reached: {}", entry.url);
                self.target_reached.store(true, Ordering::SeqCst);
            }
            return Vec::new();
        }

        {
            let mut records = self.records();
            if self.image_only {
                records.extend(page.images.iter().map(|image| {
                    CollectedRecord::Image(ImageRecord {
                        url: image.url.clone(),
                        source_page: entry.url.clone(),
                        depth: entry.depth,
                        image_type: image.kind,
                        alt_text: image.alt_text.clone(),
                        dimensions: image.dimensions,
                    })
                }));
            } else {
                let mut record = PageRecord::new(entry.url.clone(), entry.depth)
                    .with_content(&page.text_content);
                record.title = page.title.clone();
                record.meta_description = page.meta_description.clone();
                record.h1_tags = page.h1_tags.clone();
                record.content_type = page.content_type.clone();
                record.load_time_ms = page.load_time.as_millis() as u64;
                records.push(CollectedRecord::Page(record));
            }
        }

        if is_target {
            info!("Target reached: {}", entry.url);
            self.target_reached.store(true, Ordering::SeqCst);
            return Vec::new();
        }

        let child_depth = entry.depth + 1;
        let mut children = Vec::new();
        for link in &page.discovered_links {
            if self.budget.is_visited(link) {
                continue;
            }
            if !self.budget.allows_depth(child_depth) {
                self.budget.record_skip();
                continue;
            }
            if !self.scope.filter(link, &self.budget) {
                continue;
            }
            let priority = self
                .scorer
                .as_ref()
                .map(|scorer| scorer.score(link, &entry.url))
                .unwrap_or(0);
            children.push(entry.child(link, priority));
        }
        children
    }

    /// Single-worker loop: pop, visit, push, until something halts it.
    async fn drain(&self, frontier: &mut Frontier) -> Termination {
        loop {
            if let Some(reason) = self.termination(frontier.is_empty()) {
                return reason;
            }
            let Some(entry) = frontier.pop() else {
                return Termination::FrontierExhausted;
            };
            let children = self.visit(0, &entry).await;
            frontier.extend(children);
        }
    }
}

struct FrontierState {
    frontier: Frontier,
    in_flight: usize,
}

impl<F: PageFetcher + 'static> Visitor<F> {
    /// Multi-worker loop. Workers exit once the frontier is empty and no
    /// visit is still in flight, or the run is halted.
    async fn drain_concurrent(self: Arc<Self>, frontier: Frontier, workers: usize) -> Result<Termination> {
        let shared = Arc::new(Mutex::new(FrontierState {
            frontier,
            in_flight: 0,
        }));

        let mut worker_handles = Vec::new();
        for worker_id in 0..workers {
            let visitor = self.clone();
            let shared = shared.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    if visitor.halt_reason().is_some() {
                        break;
                    }

                    let work_item = {
                        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                        match state.frontier.pop() {
                            Some(entry) => {
                                state.in_flight += 1;
                                Some(entry)
                            }
                            None if state.in_flight == 0 => break,
                            None => None,
                        }
                    };

                    let Some(entry) = work_item else {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };

                    let children = visitor.visit(worker_id, &entry).await;

                    {
                        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                        state.in_flight -= 1;
                        state.frontier.extend(children);
                    }
                }
                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let frontier_empty = shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frontier
            .is_empty();
        Ok(self
            .termination(frontier_empty)
            .unwrap_or(Termination::FrontierExhausted))
    }
}

pub struct TraversalEngine<F: PageFetcher> {
    fetcher: Arc<F>,
    config: EngineConfig,
    observer: Arc<dyn CrawlObserver>,
    progress_callback: Option<ProgressCallback>,
    stop: StopHandle,
    state: Mutex<EngineState>,
}

impl<F: PageFetcher + 'static> TraversalEngine<F> {
    /// Validates scope patterns and the smart-mode target up front.
    pub fn new(fetcher: F, config: EngineConfig) -> Result<Self> {
        ScopePolicy::new(&config.scope, &[])?;
        if let TraversalMode::Smart { ref target } = config.mode {
            PriorityScorer::new(target)?;
        }

        Ok(Self {
            fetcher: Arc::new(fetcher),
            config,
            observer: Arc::new(TracingObserver),
            progress_callback: None,
            stop: StopHandle::new(),
            state: Mutex::new(EngineState::Idle),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: EngineState) {
        debug!("Engine state: {:?}", state);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Crawls from `seeds` and returns whatever was collected, including on
    /// cancellation or timeout. Only configuration problems are errors.
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlOutcome> {
        for seed in seeds {
            Url::parse(seed)
                .map_err(|e| ScanError::InvalidUrl(format!("Invalid seed '{}': {}", seed, e)))?;
        }

        let scorer = match self.config.mode {
            TraversalMode::Smart { ref target } => Some(PriorityScorer::new(target)?),
            TraversalMode::Direct => None,
        };

        let visitor = Arc::new(Visitor {
            fetcher: self.fetcher.clone(),
            observer: self.observer.clone(),
            progress: self.progress_callback.clone(),
            stop: self.stop.clone(),
            deadline: self.config.deadline.map(|d| Instant::now() + d),
            page_timeout: self.config.page_timeout,
            content_filter: self.config.content_filter.clone(),
            image_only: self.config.image_only,
            scope: ScopePolicy::new(&self.config.scope, seeds)?,
            scorer,
            budget: VisitBudget::new(self.config.max_depth, self.config.max_pages),
            stats: StatsAggregator::new(),
            lineage: LineageTracker::new(),
            records: Mutex::new(Vec::new()),
            target_reached: AtomicBool::new(false),
        });

        if !self.config.cookies.is_empty() {
            for seed in seeds {
                self.fetcher.inject_cookies(seed, &self.config.cookies);
            }
        }

        info!(
            "Starting crawl of {} seed(s) with {} worker(s), max depth {}, max pages {}",
            seeds.len(),
            self.config.workers,
            self.config.max_depth,
            self.config.max_pages
        );

        let seed_entries: Vec<FrontierEntry> =
            seeds.iter().map(|seed| FrontierEntry::seed(seed)).collect();

        let termination = match self.config.mode {
            TraversalMode::Direct => {
                let mut frontier = Frontier::stack();
                frontier.extend(seed_entries);
                self.set_state(EngineState::SeedVisiting);

                if self.config.workers > 1 {
                    self.set_state(EngineState::DirectRecursing);
                    visitor.clone().drain_concurrent(frontier, self.config.workers).await?
                } else {
                    loop {
                        if let Some(reason) = visitor.termination(frontier.is_empty()) {
                            break reason;
                        }
                        let Some(entry) = frontier.pop() else {
                            break Termination::FrontierExhausted;
                        };
                        if entry.depth > 0 && self.state() == EngineState::SeedVisiting {
                            self.set_state(EngineState::DirectRecursing);
                        }
                        let children = visitor.visit(0, &entry).await;
                        frontier.extend(children);
                    }
                }
            }
            TraversalMode::Smart { .. } => {
                self.set_state(EngineState::SeedVisiting);
                let mut frontier = Frontier::priority();
                for entry in &seed_entries {
                    if visitor.halt_reason().is_some() {
                        break;
                    }
                    let children = visitor.visit(0, entry).await;
                    frontier.extend(children);
                }

                self.set_state(EngineState::SmartDraining);
                if self.config.workers > 1 {
                    visitor.clone().drain_concurrent(frontier, self.config.workers).await?
                } else {
                    visitor.drain(&mut frontier).await
                }
            }
        };

        self.set_state(EngineState::Done);

        let stats = visitor
            .stats
            .snapshot(visitor.budget.pages_skipped(), visitor.lineage.snapshot());
        let records = std::mem::take(&mut *visitor.records());

        match termination {
            Termination::Cancelled | Termination::TimedOut => warn!(
                "Crawl {} after {} pages; returning partial results",
                termination.as_str(),
                stats.pages_crawled
            ),
            _ => info!(
                "Crawl complete ({}). Visited {} pages, {} errors, {} skipped",
                termination.as_str(),
                stats.pages_crawled,
                stats.errors,
                stats.skipped
            ),
        }

        Ok(CrawlOutcome {
            bundle: pack(records, stats),
            termination,
        })
    }
}
