//! Reporting hooks for everything a crawl sees. Observers never steer traversal.

use crate::cookies::CookieSnapshot;
use crate::error::ScanError;
use crate::fetcher::{DiscoveredImage, DiscoveredScript};
use std::time::Duration;
use tracing::{debug, info, warn};

pub trait CrawlObserver: Send + Sync {
    fn page_visited(&self, _url: &str, _depth: usize, _status: u16, _load_time: Duration) {}

    fn image_discovered(&self, _page_url: &str, _image: &DiscoveredImage) {}

    fn script_discovered(&self, _page_url: &str, _script: &DiscoveredScript) {}

    fn cookies_changed(&self, _page_url: &str, _changed: &[CookieSnapshot]) {}

    fn fetch_failed(&self, _url: &str, _error: &ScanError) {}

    fn performance(&self, _url: &str, _metric: &str, _value_ms: f64) {}
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn page_visited(&self, url: &str, depth: usize, status: u16, load_time: Duration) {
        info!(
            "Visited {} (depth {}, status {}, {} ms)",
            url,
            depth,
            status,
            load_time.as_millis()
        );
    }

    fn image_discovered(&self, page_url: &str, image: &DiscoveredImage) {
        debug!("Image on {}: {} ({})", page_url, image.url, image.kind.as_str());
    }

    fn script_discovered(&self, page_url: &str, script: &DiscoveredScript) {
        match &script.url {
            Some(src) => debug!(
                "Script on {}: {} (async: {}, defer: {})",
                page_url, src, script.is_async, script.is_defer
            ),
            None => debug!(
                "Inline script on {} ({} bytes)",
                page_url,
                script.inline_size.unwrap_or(0)
            ),
        }
    }

    fn cookies_changed(&self, page_url: &str, changed: &[CookieSnapshot]) {
        for cookie in changed {
            info!("Cookie set by {}: {}={}", page_url, cookie.name, cookie.value);
        }
    }

    fn fetch_failed(&self, url: &str, error: &ScanError) {
        warn!("Crawl error for {}: {}", url, error);
    }

    fn performance(&self, url: &str, metric: &str, value_ms: f64) {
        debug!("{} {}: {:.1} ms", url, metric, value_ms);
    }
}
