//! The page fetching seam and its HTTP implementation.
//!
//! The engine only ever talks to [`PageFetcher`]. [`HttpFetcher`] is the
//! stock implementation: reqwest for transport, a shared cookie jar, and
//! scraper for pulling links, text and media references out of HTML.

use crate::cookies::{CookieSnapshot, parse_cookie_header};
use crate::error::{Result, ScanError};
use crate::result::ImageKind;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredImage {
    pub url: String,
    pub kind: ImageKind,
    pub alt_text: Option<String>,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredScript {
    /// `None` for inline scripts.
    pub url: Option<String>,
    pub is_async: bool,
    pub is_defer: bool,
    pub inline_size: Option<usize>,
}

/// Everything a visit produced.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// Absolute, fragment-free, de-duplicated, in document order.
    pub discovered_links: Vec<String>,
    pub title: String,
    pub text_content: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub images: Vec<DiscoveredImage>,
    pub scripts: Vec<DiscoveredScript>,
    pub cookies_after: Vec<CookieSnapshot>,
    pub load_time: Duration,
}

impl FetchedPage {
    fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches and renders `url`. Errors are per-page and never fatal to a crawl.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Cookies the fetcher would currently send to `url`.
    async fn cookies(&self, _url: &str) -> Vec<CookieSnapshot> {
        Vec::new()
    }

    /// Installs cookies to be sent with requests to `url`'s site.
    fn inject_cookies(&self, _url: &str, _cookies: &BTreeMap<String, String>) {}
}

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector is valid"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("meta selector is valid")
});
static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("h1 selector is valid"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector is valid"));
static STYLED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("style selector is valid"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector is valid"));
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).expect("css url regex is valid")
});

pub struct HttpFetcher {
    client: Client,
    jar: Arc<Jar>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(15)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; Silky/0.2; +https://github.com/trapdoorsec/silky)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self { client, jar })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await?.to_vec();
        let load_time = start.elapsed();

        if status >= 400 {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let mut page = FetchedPage {
            final_url,
            status,
            content_type,
            body,
            load_time,
            ..FetchedPage::default()
        };

        if page.is_html() {
            let html = String::from_utf8_lossy(&page.body).into_owned();
            let base = page.final_url.clone();
            extract_elements(&html, &base, &mut page);
        }

        page.cookies_after = self.cookies(&page.final_url).await;
        Ok(page)
    }

    async fn cookies(&self, url: &str) -> Vec<CookieSnapshot> {
        let Ok(parsed) = Url::parse(url) else {
            return Vec::new();
        };
        self.jar
            .cookies(&parsed)
            .and_then(|header| header.to_str().ok().map(|h| parse_cookie_header(h, url)))
            .unwrap_or_default()
    }

    fn inject_cookies(&self, url: &str, cookies: &BTreeMap<String, String>) {
        let Ok(parsed) = Url::parse(url) else {
            return;
        };
        for (name, value) in cookies {
            self.jar.add_cookie_str(&format!("{}={}", name, value), &parsed);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Fills links, text and media references of `page` from its HTML.
pub fn extract_elements(html: &str, current_url: &str, page: &mut FetchedPage) {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    for element in document.select(&LINK_SELECTOR) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(current_url, href)
            && seen.insert(absolute_url.clone())
        {
            page.discovered_links.push(absolute_url);
        }
    }

    page.title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();

    page.meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    page.h1_tags = document
        .select(&H1_SELECTOR)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    page.text_content = document
        .select(&BODY_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default();

    for img in document.select(&IMG_SELECTOR) {
        let attrs = img.value();
        let Some(src) = attrs.attr("src").or_else(|| attrs.attr("data-src")) else {
            continue;
        };
        let Some(url) = resolve_url(current_url, src) else {
            continue;
        };
        let dimensions = match (attrs.attr("width"), attrs.attr("height")) {
            (Some(w), Some(h)) => w.trim().parse().ok().zip(h.trim().parse().ok()),
            _ => None,
        };
        page.images.push(DiscoveredImage {
            url,
            kind: ImageKind::ImgTag,
            alt_text: attrs.attr("alt").map(str::to_string),
            dimensions,
        });
    }

    for styled in document.select(&STYLED_SELECTOR) {
        let Some(style) = styled.value().attr("style") else {
            continue;
        };
        for capture in CSS_URL.captures_iter(style) {
            if let Some(url) = resolve_url(current_url, capture[1].trim()) {
                page.images.push(DiscoveredImage {
                    url,
                    kind: ImageKind::CssBackground,
                    alt_text: None,
                    dimensions: None,
                });
            }
        }
    }

    for script in document.select(&SCRIPT_SELECTOR) {
        let attrs = script.value();
        let url = attrs.attr("src").and_then(|src| resolve_url(current_url, src));
        let inline_size = if url.is_none() {
            Some(script.text().map(str::len).sum())
        } else {
            None
        };
        page.scripts.push(DiscoveredScript {
            url,
            is_async: attrs.attr("async").is_some(),
            is_defer: attrs.attr("defer").is_some(),
            inline_size,
        });
    }
}

/// Resolves `href` against `base`, dropping non-navigational schemes and the fragment.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut url = base_url.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[test]
    fn test_resolve_url_skips_pseudo_links() {
        assert_eq!(resolve_url("https://a.com/x/", "#top"), None);
        assert_eq!(resolve_url("https://a.com/x/", "mailto:me@a.com"), None);
        assert_eq!(resolve_url("https://a.com/x/", "javascript:void(0)"), None);
        assert_eq!(
            resolve_url("https://a.com/x/", "page#section"),
            Some("https://a.com/x/page".to_string())
        );
        assert_eq!(
            resolve_url("https://a.com/x/", "/root"),
            Some("https://a.com/root".to_string())
        );
    }

    #[test]
    fn test_extract_elements() {
        let html = r#"<html>
            <head>
                <title> Docs  Home </title>
                <meta name="description" content=" All the docs ">
                <script src="/app.js" async></script>
                <script>var x = 1;</script>
            </head>
            <body>
                <h1>Welcome</h1>
                <a href="/b">B</a>
                <a href="https://external.com/c">C</a>
                <a href="/b#again">B again</a>
                <img src="/logo.png" alt="Logo" width="32" height="16">
                <div style="background: url('/bg.jpg')">text</div>
            </body>
        </html>"#;

        let mut page = FetchedPage::default();
        extract_elements(html, "https://a.com/", &mut page);

        assert_eq!(
            page.discovered_links,
            vec!["https://a.com/b", "https://external.com/c"]
        );
        assert_eq!(page.title, "Docs Home");
        assert_eq!(page.meta_description, "All the docs");
        assert_eq!(page.h1_tags, vec!["Welcome"]);
        assert!(page.text_content.contains("Welcome"));

        assert_eq!(page.images.len(), 2);
        assert_eq!(page.images[0].dimensions, Some((32, 16)));
        assert_eq!(page.images[0].alt_text.as_deref(), Some("Logo"));
        assert_eq!(page.images[1].url, "https://a.com/bg.jpg");
        assert_eq!(page.images[1].kind, ImageKind::CssBackground);

        assert_eq!(page.scripts.len(), 2);
        assert!(page.scripts[0].is_async);
        assert_eq!(page.scripts[1].url, None);
        assert_eq!(page.scripts[1].inline_size, Some("var x = 1;".len()));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mock_server = MockServer::start().await;
        let html = format!(
            r#"<html><head><title>Root</title></head><body>
                <a href="{}/page1">Page 1</a>
            </body></html>"#,
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .insert_header("set-cookie", "session=abc; Path=/")
                    .set_body_bytes(html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&format!("{}/", mock_server.uri())).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.title, "Root");
        assert_eq!(page.discovered_links, vec![format!("{}/page1", mock_server.uri())]);
        assert_eq!(page.cookies_after.len(), 1);
        assert_eq!(page.cookies_after[0].name, "session");
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_injected_cookies_are_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(wiremock::matchers::header("cookie", "token=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("ok"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/", mock_server.uri());
        let mut cookies = BTreeMap::new();
        cookies.insert("token".to_string(), "secret".to_string());
        fetcher.inject_cookies(&url, &cookies);

        let page = fetcher.fetch(&url).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.discovered_links.is_empty());
    }
}
