// Tests for crawl functionality

use silky_core::crawl::{
    CrawlOptions, CrawlProgressCallback, HostLimits, execute_crawl, extract_url_path,
};
use silky_scanner::TraversalMode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    let url = "http://example.com/";
    let path = extract_url_path(url);
    assert_eq!(path, "/");
}

#[test]
fn test_extract_url_path_empty_path() {
    let url = "http://example.com";
    let path = extract_url_path(url);
    assert_eq!(path, "/");
}

#[test]
fn test_extract_url_path_nested() {
    let url = "http://example.com/api/v1/users";
    let path = extract_url_path(url);
    assert_eq!(path, "/api/v1/users");
}

#[test]
fn test_extract_url_path_with_query_and_fragment() {
    let url = "http://example.com/api?key=value#top";
    let path = extract_url_path(url);
    assert_eq!(path, "/api");
}

#[test]
fn test_extract_url_path_invalid_url() {
    let url = "not a valid url";
    let path = extract_url_path(url);
    // Should return original string for invalid URLs
    assert_eq!(path, url);
}

// ============================================================================
// Option Mapping Tests
// ============================================================================

#[test]
fn test_engine_config_defaults() {
    let config = CrawlOptions::new(vec!["https://a.com".to_string()]).engine_config();
    assert_eq!(config.max_depth, 0);
    assert_eq!(config.max_pages, 0);
    assert_eq!(config.workers, 1);
    assert_eq!(config.mode, TraversalMode::Direct);
    assert_eq!(config.deadline, None);
    assert!(config.cookies.is_empty());
}

#[test]
fn test_engine_config_maps_every_option() {
    let options = CrawlOptions {
        workers: 4,
        max_depth: 3,
        max_pages: 50,
        stop_on_url: Some("https://a.com/target".to_string()),
        site_only: true,
        include_pattern: Some("docs".to_string()),
        exclude_pattern: Some("N/A".to_string()),
        file_types: Some("pdf, .ZIP".to_string()),
        content_filter: Some("Rust".to_string()),
        cookies: Some("session=abc; theme=dark".to_string()),
        timeout_secs: Some(60),
        ..CrawlOptions::new(vec!["https://a.com".to_string()])
    };

    let config = options.engine_config();
    assert_eq!(config.workers, 4);
    assert_eq!(
        config.mode,
        TraversalMode::Smart {
            target: "https://a.com/target".to_string()
        }
    );
    assert!(config.scope.restrict_to_seed_domain);
    assert_eq!(config.scope.include_pattern.as_deref(), Some("docs"));
    assert_eq!(config.scope.exclude_pattern, None);
    assert_eq!(
        config.scope.allowed_file_extensions,
        Some(vec!["pdf".to_string(), "zip".to_string()])
    );
    assert_eq!(config.content_filter.as_deref(), Some("rust"));
    assert_eq!(config.cookies["theme"], "dark");
    assert_eq!(config.deadline, Some(Duration::from_secs(60)));
}

// ============================================================================
// Host Limit Tests
// ============================================================================

#[test]
fn test_host_limits_clamp_large_requests() {
    let limits = HostLimits::default();
    let options = CrawlOptions {
        max_depth: 500,
        max_pages: 100_000,
        timeout_secs: Some(9999),
        ..CrawlOptions::default()
    };

    let clamped = limits.clamp(options);
    assert_eq!(clamped.max_depth, 100);
    assert_eq!(clamped.max_pages, 5000);
    assert_eq!(clamped.timeout_secs, Some(300));
}

#[test]
fn test_host_limits_turn_unlimited_into_cap() {
    let limits = HostLimits {
        max_depth: 5,
        max_pages: 20,
        timeout_seconds: 30,
    };

    let clamped = limits.clamp(CrawlOptions::default());
    assert_eq!(clamped.max_depth, 5);
    assert_eq!(clamped.max_pages, 20);
    assert_eq!(clamped.timeout_secs, Some(30));
}

#[test]
fn test_host_limits_keep_small_requests() {
    let options = CrawlOptions {
        max_depth: 2,
        max_pages: 10,
        timeout_secs: Some(5),
        ..CrawlOptions::default()
    };

    let clamped = HostLimits::default().clamp(options);
    assert_eq!(clamped.max_depth, 2);
    assert_eq!(clamped.max_pages, 10);
    assert_eq!(clamped.timeout_secs, Some(5));
}

// ============================================================================
// Crawl Execution Tests
// ============================================================================

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(body.into_bytes()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_execute_crawl_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
                <a href="{base}/docs">Docs</a>
                <a href="{base}/missing">Missing</a>
                <a href="https://external.example/x">External</a>
                <img src="/logo.png" alt="logo">
            </body></html>"#
        ),
    )
    .await;
    mount_page(
        &server,
        "/docs",
        "<html><head><title>Docs</title></head><body><h1>Docs</h1></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let progress: CrawlProgressCallback = Arc::new(move |url: String| {
        seen_clone.lock().unwrap().push(url);
    });

    let options = CrawlOptions {
        site_only: true,
        ..CrawlOptions::new(vec![format!("{}/", base)])
    };
    let outcome = execute_crawl(options, Some(progress), None).await.unwrap();

    let stats = &outcome.bundle.stats;
    assert_eq!(stats.pages_crawled, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.images_found, 1);
    assert!(stats.broken_links.contains(&format!("{}/missing", base)));
    assert_eq!(outcome.bundle.pages().count(), 2);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_execute_crawl_rejects_bad_pattern() {
    let options = CrawlOptions {
        include_pattern: Some("([".to_string()),
        ..CrawlOptions::new(vec!["https://a.com".to_string()])
    };

    assert!(execute_crawl(options, None, None).await.is_err());
}
