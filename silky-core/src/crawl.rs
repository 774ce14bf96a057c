use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use silky_scanner::cookies::parse_cookie_string;
use silky_scanner::engine::ProgressCallback;
use silky_scanner::{
    CrawlOutcome, EngineConfig, HttpFetcher, ScopeConfig, StopHandle, TraversalEngine,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub workers: usize,
    pub max_depth: usize,
    pub max_pages: usize,
    /// Smart mode target
    pub stop_on_url: Option<String>,
    pub site_only: bool,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
    pub forced_domain: Option<String>,
    pub file_types: Option<String>,
    pub content_filter: Option<String>,
    pub image_only: bool,
    /// JSON object or `name=value` pairs
    pub cookies: Option<String>,
    /// Whole-run limit in seconds
    pub timeout_secs: Option<u64>,
    pub page_timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            workers: 1,
            max_depth: 0,
            max_pages: 0,
            stop_on_url: None,
            site_only: false,
            include_pattern: None,
            exclude_pattern: None,
            forced_domain: None,
            file_types: None,
            content_filter: None,
            image_only: false,
            cookies: None,
            timeout_secs: None,
            page_timeout_secs: 15,
            show_progress_bars: false,
        }
    }
}

impl CrawlOptions {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::default()
        }
    }

    /// Engine configuration equivalent to these options.
    pub fn engine_config(&self) -> EngineConfig {
        let scope = ScopeConfig::new()
            .with_restrict_to_seed_domain(self.site_only)
            .with_include_pattern(self.include_pattern.as_deref())
            .with_exclude_pattern(self.exclude_pattern.as_deref())
            .with_forced_domain_pattern(self.forced_domain.as_deref())
            .with_file_types(self.file_types.as_deref());

        let mut config = EngineConfig::new()
            .with_max_depth(self.max_depth)
            .with_max_pages(self.max_pages)
            .with_workers(self.workers)
            .with_stop_on_url(self.stop_on_url.as_deref())
            .with_scope(scope)
            .with_content_filter(self.content_filter.as_deref())
            .with_image_only(self.image_only)
            .with_page_timeout(Duration::from_secs(self.page_timeout_secs));

        if let Some(ref cookies) = self.cookies {
            config = config.with_cookies(parse_cookie_string(cookies));
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_deadline(Duration::from_secs(secs));
        }
        config
    }
}

/// Caps a shared host places on requested crawls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLimits {
    pub max_depth: usize,
    pub max_pages: usize,
    pub timeout_seconds: u64,
}

impl Default for HostLimits {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_pages: 5000,
            timeout_seconds: 300,
        }
    }
}

impl HostLimits {
    /// Clamps requested depth, pages and run time. Unlimited (0) requests get the cap.
    pub fn clamp(&self, mut options: CrawlOptions) -> CrawlOptions {
        options.max_depth = clamp_limit(options.max_depth, self.max_depth);
        options.max_pages = clamp_limit(options.max_pages, self.max_pages);
        options.timeout_secs = Some(
            options
                .timeout_secs
                .map_or(self.timeout_seconds, |secs| secs.min(self.timeout_seconds)),
        );
        options
    }
}

fn clamp_limit(requested: usize, cap: usize) -> usize {
    if requested == 0 { cap } else { requested.min(cap) }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options over HTTP.
///
/// `stop` lets another task or thread end the run early; the partial
/// results are still returned.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    stop: Option<StopHandle>,
) -> Result<CrawlOutcome> {
    let fetcher = HttpFetcher::with_timeout(options.page_timeout_secs)?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress: ProgressCallback = {
        let pb = progress_bar.clone();
        let count = processed_count.clone();
        let external = progress_callback.clone();
        Arc::new(move |_worker_id: usize, url: String| {
            let processed = count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!("Crawling... {} URLs processed", processed));
                pb.tick();
            }
            if let Some(ref callback) = external {
                callback(url);
            }
        })
    };

    let mut engine = TraversalEngine::new(fetcher, options.engine_config())?
        .with_progress_callback(internal_progress);
    if let Some(stop) = stop {
        engine = engine.with_stop_handle(stop);
    }

    info!("Crawling {} seed URL(s)", options.urls.len());
    let outcome = engine.run(&options.urls).await?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!(
            "Crawl complete ({})! {} URLs processed",
            outcome.termination.as_str(),
            total
        ));
    }

    Ok(outcome)
}
