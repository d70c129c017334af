//! Page metadata fetching.
//!
//! Downloads a bookmarked page and extracts its title and favicon. Network
//! failures never surface to the caller: the result degrades to no title and
//! a generated favicon for the page's host.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use recall_core::{defaults, Error, MetadataFetcher, PageMetadata, Result};

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static META_PROPERTY: Lazy<Selector> = Lazy::new(|| selector("meta[property][content]"));
static META_NAME: Lazy<Selector> = Lazy::new(|| selector("meta[name][content]"));
static ICON_LINK: Lazy<Selector> = Lazy::new(|| selector("link[rel][href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Favicon `rel` values in order of preference.
const ICON_RELS: [&str; 3] = ["icon", "shortcut icon", "apple-touch-icon"];

/// Parse a bookmark URL and return it with its host name.
///
/// Any absolute URL with a host is accepted; only http(s) pages are fetched.
pub fn parse_target(raw: &str) -> Result<(Url, String)> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", raw, e)))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("URL '{}' has no host", raw)))?
        .to_string();
    Ok((url, host))
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn normalize_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    normalize_text(&element.text().collect::<String>())
}

fn meta_content(document: &Html, selector: &Selector, key_attr: &str, key: &str) -> Option<String> {
    document.select(selector).find_map(|element| {
        let meta = element.value();
        meta.attr(key_attr)
            .filter(|v| v.trim().eq_ignore_ascii_case(key))
            .and_then(|_| meta.attr("content"))
            .and_then(normalize_text)
    })
}

/// Title from `<title>`, then `og:title`, then `twitter:title`.
pub fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .and_then(element_text)
        .or_else(|| meta_content(document, &META_PROPERTY, "property", "og:title"))
        .or_else(|| meta_content(document, &META_NAME, "name", "twitter:title"))
}

/// Favicon href from the preferred `<link rel>` variants, resolved against `base`.
pub fn extract_favicon(document: &Html, base: &Url) -> Option<String> {
    let href = ICON_RELS.iter().find_map(|rel| {
        document.select(&ICON_LINK).find_map(|element| {
            let link = element.value();
            link.attr("rel")
                .filter(|v| v.trim().eq_ignore_ascii_case(rel))
                .and_then(|_| link.attr("href"))
                .map(str::trim)
                .filter(|h| !h.is_empty())
        })
    })?;

    if href.starts_with("http") {
        Some(href.to_string())
    } else {
        base.join(href).ok().map(|u| u.to_string())
    }
}

/// Title and favicon of a downloaded page, favicon falling back to the generated one.
fn page_metadata(html: &str, url: &Url, domain: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let favicon =
        extract_favicon(&document, url).unwrap_or_else(|| defaults::fallback_favicon(domain));
    (title, favicon)
}

fn fallback(domain: String) -> PageMetadata {
    PageMetadata {
        title: None,
        favicon: Some(defaults::fallback_favicon(&domain)),
        domain,
    }
}

/// Metadata fetcher over HTTP with a bounded timeout.
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(defaults::METADATA_USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create from `METADATA_TIMEOUT_SECS` (default 5).
    pub fn from_env() -> Result<Self> {
        let secs = std::env::var("METADATA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::METADATA_TIMEOUT_SECS);
        Self::new(Duration::from_secs(secs))
    }

    async fn download(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, raw_url: &str) -> Result<PageMetadata> {
        let (url, domain) = parse_target(raw_url)?;
        if !is_fetchable(&url) {
            debug!(
                subsystem = "integrations",
                component = "metadata",
                op = "fetch",
                domain = %domain,
                scheme = url.scheme(),
                "Skipping metadata fetch for non-HTTP URL"
            );
            return Ok(fallback(domain));
        }
        let start = Instant::now();

        match self.download(&url).await {
            Ok(html) => {
                let (title, favicon) = page_metadata(&html, &url, &domain);
                debug!(
                    subsystem = "integrations",
                    component = "metadata",
                    op = "fetch",
                    domain = %domain,
                    has_title = title.is_some(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Fetched page metadata"
                );
                Ok(PageMetadata {
                    title,
                    favicon: Some(favicon),
                    domain,
                })
            }
            Err(e) => {
                warn!(
                    subsystem = "integrations",
                    component = "metadata",
                    op = "fetch",
                    domain = %domain,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Metadata fetch failed; using fallback"
                );
                Ok(fallback(domain))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/articles/one").unwrap()
    }

    fn title(html: &str) -> Option<String> {
        extract_title(&Html::parse_document(html))
    }

    fn favicon(html: &str) -> Option<String> {
        extract_favicon(&Html::parse_document(html), &base())
    }

    #[test]
    fn test_parse_target_requires_host() {
        let (_, host) = parse_target("https://news.example.org/a?b=c").unwrap();
        assert_eq!(host, "news.example.org");
        assert!(matches!(
            parse_target("not a url"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_target("mailto:someone@example.com"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_target_accepts_other_schemes_with_host() {
        let (url, host) = parse_target("ftp://files.example.com/pub/readme.txt").unwrap();
        assert_eq!(host, "files.example.com");
        assert!(!is_fetchable(&url));
        assert!(is_fetchable(&parse_target("http://example.com").unwrap().0));
    }

    #[test]
    fn test_title_prefers_title_tag() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG Title">
            <title>
               Real &amp; Title
            </title></head></html>"#;
        assert_eq!(title(html).as_deref(), Some("Real & Title"));
    }

    #[test]
    fn test_title_falls_back_to_og_then_twitter() {
        let og = r#"<meta content="From OG" property="og:title" />"#;
        assert_eq!(title(og).as_deref(), Some("From OG"));

        let twitter = r#"<title>  </title><meta name='twitter:title' content='From &quot;Twitter&quot;'>"#;
        assert_eq!(title(twitter).as_deref(), Some("From \"Twitter\""));

        assert_eq!(title("<html></html>"), None);
    }

    #[test]
    fn test_favicon_preference_order() {
        let html = r#"
            <link rel="apple-touch-icon" href="/apple.png">
            <link rel="shortcut icon" href="/shortcut.ico">
            <link rel="icon" href="https://cdn.example.com/icon.png">"#;
        assert_eq!(
            favicon(html).as_deref(),
            Some("https://cdn.example.com/icon.png")
        );

        let html = r#"<link href="/apple.png" rel="apple-touch-icon"><link rel="shortcut icon" href="/shortcut.ico">"#;
        assert_eq!(
            favicon(html).as_deref(),
            Some("https://example.com/shortcut.ico")
        );
    }

    #[test]
    fn test_favicon_relative_href_is_resolved() {
        let html = r#"<link rel="icon" href="favicon.png">"#;
        assert_eq!(
            favicon(html).as_deref(),
            Some("https://example.com/articles/favicon.png")
        );
    }

    #[test]
    fn test_no_favicon_link() {
        assert_eq!(favicon("<link rel=\"stylesheet\" href=\"/a.css\">"), None);
    }

    #[test]
    fn test_page_metadata_falls_back_to_generated_favicon() {
        let (title, favicon) = page_metadata("<title>Hi</title>", &base(), "example.com");
        assert_eq!(title.as_deref(), Some("Hi"));
        assert_eq!(favicon, defaults::fallback_favicon("example.com"));
    }
}
