//! One-way chat notifications about finished crawls.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use silky_scanner::ResultBundle;
use std::time::Duration;
use tracing::{debug, warn};

/// Counts-only description of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub target: String,
    pub pages_crawled: usize,
    pub errors: usize,
    pub images_found: usize,
    pub records_collected: usize,
    pub image_only: bool,
}

impl CrawlSummary {
    pub fn from_bundle(target: &str, bundle: &ResultBundle, image_only: bool) -> Self {
        Self {
            target: target.to_string(),
            pages_crawled: bundle.stats.pages_crawled,
            errors: bundle.stats.errors,
            images_found: bundle.stats.images_found,
            records_collected: bundle.data.len(),
            image_only,
        }
    }

    pub fn headline(&self) -> String {
        if self.records_collected == 0 && self.pages_crawled > 0 {
            format!(
                "Crawl of {} finished. Pages found: {}, pages collected: 0. No pages matched the filters.",
                self.target, self.pages_crawled
            )
        } else if self.records_collected == 0 {
            format!(
                "Crawl of {} returned no data. Check the URL, filters or access.",
                self.target
            )
        } else {
            format!("Crawl of {} finished.", self.target)
        }
    }
}

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn notify(&self, summary: &CrawlSummary, report: Option<&str>) -> Result<()>;
}

/// Posts to a Discord-compatible webhook: an embed with the counts and,
/// when given, the text report as an attached `results.txt`.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }

    fn payload(summary: &CrawlSummary) -> Value {
        let mut fields = vec![
            json!({"name": "Pages Scraped", "value": summary.pages_crawled.to_string(), "inline": true}),
            json!({"name": "Errors/Broken Links", "value": summary.errors.to_string(), "inline": true}),
        ];
        if summary.image_only {
            fields.push(
                json!({"name": "Images Found", "value": summary.images_found.to_string(), "inline": true}),
            );
        } else {
            fields.push(json!({
                "name": "Total Pages Collected",
                "value": format!("{} items", summary.records_collected),
                "inline": true
            }));
        }

        json!({
            "content": summary.headline(),
            "embeds": [{
                "title": "Crawl Finished",
                "color": 0x00ff00,
                "fields": fields
            }]
        })
    }
}

#[async_trait]
impl ChatNotifier for WebhookNotifier {
    async fn notify(&self, summary: &CrawlSummary, report: Option<&str>) -> Result<()> {
        let payload = Self::payload(summary);

        let request = match report {
            Some(report) => {
                let file = Part::bytes(report.as_bytes().to_vec())
                    .file_name("results.txt")
                    .mime_str("text/plain")?;
                let form = Form::new()
                    .text("payload_json", payload.to_string())
                    .part("file", file);
                self.client.post(&self.webhook_url).multipart(form)
            }
            None => self.client.post(&self.webhook_url).json(&payload),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(CoreError::Notify(format!(
                "webhook returned HTTP {}",
                response.status().as_u16()
            )));
        }

        debug!("Webhook notification delivered for {}", summary.target);
        Ok(())
    }
}

/// Sends a notification, logging instead of propagating any failure.
pub async fn notify_best_effort(
    notifier: &dyn ChatNotifier,
    summary: &CrawlSummary,
    report: Option<&str>,
) -> bool {
    match notifier.notify(summary, report).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Chat notification failed: {}", e);
            false
        }
    }
}
