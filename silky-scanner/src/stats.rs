use crate::lineage::PathMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Aggregate description of one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    #[serde(default)]
    pub pages_crawled: usize,
    #[serde(default)]
    pub errors: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub images_found: usize,
    #[serde(default)]
    pub content_types: BTreeMap<String, usize>,
    #[serde(default)]
    pub inbound_links: BTreeMap<String, usize>,
    #[serde(default, rename = "link_map")]
    pub outgoing_links: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub broken_links: BTreeSet<String>,
    #[serde(default)]
    pub path_map: PathMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl CrawlStats {
    /// Seconds between start and end, or zero when either is unknown.
    pub fn elapsed_secs(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds().max(0) as f64 / 1000.0,
            _ => 0.0,
        }
    }

    pub fn pages_per_second(&self) -> f64 {
        let elapsed = self.elapsed_secs();
        if elapsed > 0.0 {
            self.pages_crawled as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Mutex-guarded bookkeeping shared by every worker of a run.
#[derive(Debug)]
pub struct StatsAggregator {
    inner: Mutex<CrawlStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CrawlStats {
                start_time: Some(Utc::now()),
                ..CrawlStats::default()
            }),
        }
    }

    fn stats(&self) -> MutexGuard<'_, CrawlStats> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts a successful visit under its media type (parameters stripped).
    pub fn record_page(&self, content_type: Option<&str>) {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or("unknown")
            .to_lowercase();

        let mut stats = self.stats();
        stats.pages_crawled += 1;
        *stats.content_types.entry(media_type).or_insert(0) += 1;
    }

    pub fn record_error(&self, url: &str) {
        let mut stats = self.stats();
        stats.errors += 1;
        stats.broken_links.insert(url.to_string());
    }

    pub fn record_images(&self, count: usize) {
        self.stats().images_found += count;
    }

    /// Sets the outgoing list for `url` and counts inbound links for each
    /// target. Only the first call for a URL has any effect.
    pub fn record_outgoing(&self, url: &str, links: &[String]) -> bool {
        let mut stats = self.stats();
        if stats.outgoing_links.contains_key(url) {
            return false;
        }
        for link in links {
            *stats.inbound_links.entry(link.clone()).or_insert(0) += 1;
        }
        stats.outgoing_links.insert(url.to_string(), links.to_vec());
        true
    }

    /// Read-only copy of the counters, completed with the values owned by
    /// the budget and the lineage tracker.
    pub fn snapshot(&self, skipped: usize, path_map: PathMap) -> CrawlStats {
        let mut snapshot = self.stats().clone();
        snapshot.skipped = skipped;
        snapshot.path_map = path_map;
        snapshot.end_time = Some(Utc::now());
        snapshot
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
