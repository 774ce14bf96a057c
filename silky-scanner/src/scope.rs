//! Scope policy: decides which discovered URLs are eligible for visiting.
//!
//! Rules are evaluated in a fixed order and short-circuit on the first
//! failure. The policy itself is pure; counting rejections as skips is the
//! job of [`ScopePolicy::filter`], which pairs the verdict with a
//! [`VisitBudget`].

use crate::budget::VisitBudget;
use crate::error::{Result, ScanError};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Treats empty strings and the `N/A` sentinel as "not configured".
pub fn configured(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("n/a"))
        .map(str::to_string)
}

/// Last two dot-separated labels of the URL's host.
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(main_domain(&host))
}

fn main_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        host.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    pub restrict_to_seed_domain: bool,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
    pub forced_domain_pattern: Option<String>,
    pub allowed_file_extensions: Option<Vec<String>>,
}

impl ScopeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_restrict_to_seed_domain(mut self, restrict: bool) -> Self {
        self.restrict_to_seed_domain = restrict;
        self
    }

    pub fn with_include_pattern(mut self, pattern: Option<&str>) -> Self {
        self.include_pattern = configured(pattern);
        self
    }

    pub fn with_exclude_pattern(mut self, pattern: Option<&str>) -> Self {
        self.exclude_pattern = configured(pattern);
        self
    }

    pub fn with_forced_domain_pattern(mut self, pattern: Option<&str>) -> Self {
        self.forced_domain_pattern = configured(pattern);
        self
    }

    /// Accepts a comma separated list such as `html,php`.
    pub fn with_file_types(mut self, file_types: Option<&str>) -> Self {
        self.allowed_file_extensions = configured(file_types).map(|list| {
            list.split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect()
        });
        self
    }
}

/// Why a URL fell out of scope. Rejections are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRejection {
    ForeignDomain,
    NotIncluded,
    Excluded,
    OutsideForcedDomain,
    DisallowedExtension,
}

#[derive(Debug, Clone)]
enum HostMatcher {
    Exact(String),
    Wildcard(Regex),
}

/// A `scheme://host/path` template where `*` acts as a wildcard.
///
/// In the host a `*` matches one run of non-dot characters. The path is
/// always matched as a prefix; a `*` inside it matches within one segment
/// and a trailing `*` matches any suffix.
#[derive(Debug, Clone)]
pub struct DomainPattern {
    scheme: Option<String>,
    host: HostMatcher,
    path: Regex,
}

impl DomainPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = pattern
            .split_once("://")
            .ok_or_else(|| invalid("expected scheme://host/path"))?;
        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let scheme = match scheme.to_lowercase().as_str() {
            "*" => None,
            "" => return Err(invalid("empty scheme")),
            other => Some(other.to_string()),
        };

        let host = host.to_lowercase();
        let host = if host.contains('*') {
            let source = host
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("[^.]+");
            let regex = Regex::new(&format!("^{}$", source)).map_err(|e| invalid(&e.to_string()))?;
            HostMatcher::Wildcard(regex)
        } else {
            HostMatcher::Exact(host)
        };

        let literal = path.strip_suffix('*').unwrap_or(path);
        let source = literal
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[^/]*");
        let path = Regex::new(&format!("^{}", source)).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self { scheme, host, path })
    }

    pub fn matches(&self, url: &Url) -> bool {
        if let Some(ref scheme) = self.scheme
            && url.scheme() != scheme
        {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        let host_ok = match &self.host {
            HostMatcher::Exact(expected) => &host == expected,
            HostMatcher::Wildcard(regex) => regex.is_match(&host),
        };

        host_ok && self.path.is_match(url.path())
    }
}

#[derive(Debug, Clone)]
pub struct ScopePolicy {
    restrict_to_seed_domain: bool,
    seed_domains: HashSet<String>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    forced_domain: Option<DomainPattern>,
    allowed_extensions: Option<Vec<String>>,
}

impl ScopePolicy {
    /// Compiles the configuration. Invalid patterns fail here, before any traversal.
    pub fn new(config: &ScopeConfig, seeds: &[String]) -> Result<Self> {
        let compile = |pattern: &Option<String>| -> Result<Option<Regex>> {
            pattern
                .as_deref()
                .map(|p| {
                    Regex::new(p).map_err(|e| ScanError::InvalidPattern {
                        pattern: p.to_string(),
                        reason: e.to_string(),
                    })
                })
                .transpose()
        };

        let seed_domains = if config.restrict_to_seed_domain {
            seeds
                .iter()
                .map(|seed| {
                    registrable_domain(seed)
                        .ok_or_else(|| ScanError::InvalidUrl(format!("seed has no host: {}", seed)))
                })
                .collect::<Result<HashSet<_>>>()?
        } else {
            HashSet::new()
        };

        Ok(Self {
            restrict_to_seed_domain: config.restrict_to_seed_domain,
            seed_domains,
            include: compile(&config.include_pattern)?,
            exclude: compile(&config.exclude_pattern)?,
            forced_domain: config
                .forced_domain_pattern
                .as_deref()
                .map(DomainPattern::parse)
                .transpose()?,
            allowed_extensions: config.allowed_file_extensions.clone(),
        })
    }

    pub fn evaluate(&self, url: &str) -> std::result::Result<(), ScopeRejection> {
        if self.restrict_to_seed_domain {
            match registrable_domain(url) {
                Some(domain) if self.seed_domains.contains(&domain) => {}
                _ => return Err(ScopeRejection::ForeignDomain),
            }
        }

        if let Some(ref include) = self.include
            && !include.is_match(url)
        {
            return Err(ScopeRejection::NotIncluded);
        }

        if let Some(ref exclude) = self.exclude
            && exclude.is_match(url)
        {
            return Err(ScopeRejection::Excluded);
        }

        if let Some(ref forced) = self.forced_domain {
            match Url::parse(url) {
                Ok(parsed) if forced.matches(&parsed) => {}
                _ => return Err(ScopeRejection::OutsideForcedDomain),
            }
        }

        if let Some(ref allowed) = self.allowed_extensions {
            match final_segment_extension(url) {
                Some(ext) if allowed.contains(&ext) => {}
                _ => return Err(ScopeRejection::DisallowedExtension),
            }
        }

        Ok(())
    }

    pub fn in_scope(&self, url: &str) -> bool {
        self.evaluate(url).is_ok()
    }

    /// Applies the policy and counts a rejection as exactly one skip.
    pub fn filter(&self, url: &str, budget: &VisitBudget) -> bool {
        match self.evaluate(url) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Out of scope ({:?}): {}", reason, url);
                budget.record_skip();
                false
            }
        }
    }
}

fn final_segment_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
