// Tests for chat notifications

use silky_core::notify::{ChatNotifier, CrawlSummary, WebhookNotifier, notify_best_effort};
use silky_scanner::bundle::pack;
use silky_scanner::{CollectedRecord, CrawlStats, PageRecord};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header_exists, method, path},
};

fn summary(records_collected: usize) -> CrawlSummary {
    CrawlSummary {
        target: "https://a.com".to_string(),
        pages_crawled: 5,
        errors: 1,
        images_found: 2,
        records_collected,
        image_only: false,
    }
}

#[test]
fn test_summary_from_bundle() {
    let stats = CrawlStats {
        pages_crawled: 4,
        errors: 2,
        images_found: 7,
        ..CrawlStats::default()
    };
    let bundle = pack(
        vec![CollectedRecord::Page(PageRecord::new("https://a.com".into(), 0))],
        stats,
    );

    let summary = CrawlSummary::from_bundle("https://a.com", &bundle, true);
    assert_eq!(summary.pages_crawled, 4);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.images_found, 7);
    assert_eq!(summary.records_collected, 1);
    assert!(summary.image_only);
}

#[test]
fn test_headline_explains_empty_results() {
    assert!(summary(0).headline().contains("No pages matched the filters"));
    let nothing = CrawlSummary {
        pages_crawled: 0,
        ..summary(0)
    };
    assert!(nothing.headline().contains("returned no data"));
    assert!(summary(3).headline().ends_with("finished."));
}

#[tokio::test]
async fn test_webhook_posts_summary_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&format!("{}/hook", server.uri())).unwrap();
    notifier.notify(&summary(3), None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let fields = &body["embeds"][0]["fields"];
    assert_eq!(body["embeds"][0]["title"], "Crawl Finished");
    assert_eq!(fields[0]["value"], "5");
    assert_eq!(fields[2]["name"], "Total Pages Collected");
}

#[tokio::test]
async fn test_webhook_attaches_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&format!("{}/hook", server.uri())).unwrap();
    notifier
        .notify(&summary(3), Some("full report text"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("results.txt"));
    assert!(body.contains("full report text"));
    assert!(body.contains("payload_json"));
}

#[tokio::test]
async fn test_failures_are_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(&server.uri()).unwrap();
    assert!(notifier.notify(&summary(1), None).await.is_err());
    assert!(!notify_best_effort(&notifier, &summary(1), None).await);
}

#[tokio::test]
async fn test_unreachable_webhook_is_swallowed() {
    let notifier = WebhookNotifier::new("http://127.0.0.1:1/hook").unwrap();
    assert!(!notify_best_effort(&notifier, &summary(1), None).await);
}
