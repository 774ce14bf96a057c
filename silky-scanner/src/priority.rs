//! Relevance scoring for smart (stop-on-URL) mode.

use crate::error::{Result, ScanError};
use crate::scope::registrable_domain;
use url::Url;

/// Score of the target itself; nothing else can reach it.
pub const TARGET_SCORE: i64 = 1000;

const TARGET_SUBSTRING_BONUS: i64 = 100;
const SAME_SITE_BONUS: i64 = 50;
const SAME_HOST_AS_CURRENT_BONUS: i64 = 5;
const LOW_VALUE_PENALTY: i64 = -10;

/// Links that rarely lead anywhere interesting.
pub const LOW_VALUE_KEYWORDS: &[&str] = &[
    "about",
    "terms",
    "privacy",
    "policy",
    "cookie",
    "legal",
    "disclaimer",
    "contact",
    "sitemap",
    "help",
];

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

fn same_resource(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => false,
    }
}

/// Scores `candidate`, discovered on `current`, against `target`.
pub fn score(candidate: &str, current: &str, target: &str) -> i64 {
    if same_resource(candidate, target) {
        return TARGET_SCORE;
    }

    let candidate_lower = candidate.to_lowercase();
    let mut total = 0;

    if candidate_lower.contains(&target.to_lowercase()) {
        total += TARGET_SUBSTRING_BONUS;
    }

    if let (Some(a), Some(b)) = (registrable_domain(candidate), registrable_domain(target))
        && a == b
    {
        total += SAME_SITE_BONUS;
    }

    if let (Some(a), Some(b)) = (host_of(candidate), host_of(current))
        && a == b
    {
        total += SAME_HOST_AS_CURRENT_BONUS;
    }

    if LOW_VALUE_KEYWORDS
        .iter()
        .any(|keyword| candidate_lower.contains(keyword))
    {
        total += LOW_VALUE_PENALTY;
    }

    total
}

/// Scorer bound to one validated target URL.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    target: String,
}

impl PriorityScorer {
    pub fn new(target: &str) -> Result<Self> {
        let parsed = Url::parse(target)
            .map_err(|e| ScanError::InvalidUrl(format!("priority target '{}': {}", target, e)))?;
        if parsed.host_str().is_none() {
            return Err(ScanError::InvalidUrl(format!(
                "priority target '{}' has no host",
                target
            )));
        }
        Ok(Self {
            target: target.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_target(&self, url: &str) -> bool {
        same_resource(url, &self.target)
    }

    pub fn score(&self, candidate: &str, current: &str) -> i64 {
        score(candidate, current, &self.target)
    }
}
